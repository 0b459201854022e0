fn main() -> anyhow::Result<()> {
    addsvc::cli::run_cli()
}
