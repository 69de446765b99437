use anyhow::Context;

mod config;

fn init_logging(verbose: bool) {
    let pipeline_level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .filter_module("ffmpeg_pump", pipeline_level)
        .parse_default_env()
        .init();
}

fn run(config: &config::Config) -> anyhow::Result<()> {
    ffmpeg_pump::init(config.verbose).context("ffmpeg_pump init")?;

    let summary = ffmpeg_pump::transcode(&config.input, &config.output, &config.to_options())
        .with_context(|| {
            format!(
                "transcoding {} to {}",
                config.input.display(),
                config.output.display()
            )
        })?;

    log::info!(
        "{} -> {}: {} frames decoded, {} frames encoded, {} bytes written",
        config.input.display(),
        config.output.display(),
        summary.frames_decoded,
        summary.frames_encoded,
        summary.bytes_written
    );
    Ok(())
}

fn main() {
    let config = config::Config::load().unwrap_or_else(|e| {
        eprintln!("Error: {:#}", e);
        std::process::exit(2);
    });
    init_logging(config.verbose);

    if let Err(e) = run(&config) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
