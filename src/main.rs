use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::info;
use meaview::buffers::FrontBlock;
use meaview::layout::ChannelLayout;
use meaview::source::{display_sink, FrameSource, SimulatedSource, StreamPump};
use meaview::{Canvas, DisplayConfig, DisplayEvent, GridSpec, LiveDisplay, OwnerAssignment};
use tokio::sync::broadcast;

/// Writes a one-line summary of a few channels per draw
struct LoggingCanvas {
    layout: ChannelLayout,
}

impl Canvas for LoggingCanvas {
    fn draw(&mut self, blocks: &[Arc<FrontBlock>]) -> Result<()> {
        for block in blocks.iter().take(6) {
            let label = self
                .layout
                .placement(block.channel)
                .map(|p| p.label.as_str())
                .unwrap_or("?");
            let (lower, upper) = block.format.value_range;
            info!(
                "#{:<3} {:>16}  block {:>3}  [{:>9.2}, {:>9.2}]{}",
                block.channel,
                label,
                block.sequence,
                lower,
                upper,
                if block.format.is_autoscaled() { "  auto" } else { "" }
            );
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("meaview - simulated 64 channel MCS recording");
    println!("============================================\n");

    let mut source = SimulatedSource::new(64, 10_000.0);
    source.configure(&serde_json::json!({ "frequency": 2.0, "gain": 0.001 }))?;
    let metadata = source.metadata().await?;
    let kind = metadata.array_kind();

    let config = DisplayConfig::from_json(serde_json::json!({
        "refresh_interval": 0.5,
        "sample_rate": metadata.sample_rate,
        "scale": kind.default_display_range(),
        "scale_multiplier": kind.scale_multiplier(),
    }))?;
    let canvas = LoggingCanvas {
        layout: ChannelLayout::channel_order(kind, metadata.channel_count),
    };

    let mut display = LiveDisplay::new(config.clone(), Box::new(canvas))?;
    let assignment = OwnerAssignment::round_robin(metadata.channel_count, config.worker_count());
    display.setup_grid(GridSpec::from_metadata(&metadata), assignment)?;
    display.toggle_selected(4);
    let events = display.events();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let mut pump = StreamPump::new(source, metadata.sample_rate, config.chunk_samples());
    let frames = pump
        .run(
            display_sink(&mut display),
            shutdown_rx,
            Some(Duration::from_millis(5)),
            Some(30),
        )
        .await?;
    drop(shutdown_tx);
    info!("Pumped {} frames, play position {:.1}s", frames, pump.position());

    let mut completed = 0;
    while let Ok(event) = events.recv_timeout(Duration::from_millis(500)) {
        if let DisplayEvent::RenderComplete { round, error, .. } = event {
            completed += 1;
            if let Some(error) = error {
                info!("Round {} failed: {}", round, error);
            }
        }
        if completed as u64 >= display.render_rounds() {
            break;
        }
    }

    let monitor = display.monitor();
    display.teardown()?;

    println!("\n{}", monitor.generate_report());
    Ok(())
}
