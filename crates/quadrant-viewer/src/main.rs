use quadrant_engine::device::GpuInit;
use quadrant_engine::logging::{LoggingConfig, init_logging};
use quadrant_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "Quadrant: indexed quad".to_string(),
        initial_size: LogicalSize::new(1280.0, 720.0),
    };

    log::info!("starting {}", config.title);
    Runtime::run(config, GpuInit::default())
}
