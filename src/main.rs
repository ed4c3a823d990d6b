use env_logger::Env;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::new().filter_or("BEATLOOKUP_LOG", "warn"))
        .format_timestamp(None)
        .init();

    beatlookup::cli::run()
}
