use apigen::cli::CommandLineInterface;

fn main() -> anyhow::Result<()> {
    let command_line_interface = CommandLineInterface::load();
    apigen::logging::init(command_line_interface.debug());
    command_line_interface.run()
}
