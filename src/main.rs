fn main() {
    #[cfg(feature = "cli")]
    assetpack::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("assetpack: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
