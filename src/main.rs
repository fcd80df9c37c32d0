// palfb demo - Diagonal CGA stripes with palette cycling
//
// Draws once into the frame buffer, then animates only by rotating the
// first 16 palette entries, rendering until the window is closed.

use palfb::{delay, Presenter, PresenterConfig, WindowFlags, CGA_PALETTE};

const CONFIG_FILE: &str = "palfb.toml";

/// Frames between palette rotations
const ROTATE_EVERY: u32 = 6;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PresenterConfig::load(CONFIG_FILE).unwrap_or_else(|_| {
        PresenterConfig::new(160, 120)
            .with_window_size(160 * 8, 120 * 8)
            .with_title("palfb demo")
            .with_flags(WindowFlags::RESIZABLE | WindowFlags::INTEGER_SCALE)
    });
    let width = config.buffer_width as usize;
    let height = config.buffer_height as usize;

    let mut presenter = Presenter::open(config).map_err(|err| {
        log::error!("{} (code {})", err, err.code());
        err
    })?;

    presenter.palette().load(&CGA_PALETTE);
    for y in 0..height {
        for x in 0..width {
            presenter.plot(x, y, ((x + y) % 16) as u8);
        }
    }

    let mut frames: u32 = 0;
    let start = presenter.elapsed_ms();
    while !presenter.has_terminated() {
        if let Err(err) = presenter.render() {
            if err.is_terminal() {
                break;
            }
            log::warn!("frame {} dropped: {}", frames, err);
        }
        frames += 1;

        if frames % ROTATE_EVERY == 0 {
            let elapsed = presenter.elapsed_ms().wrapping_sub(start).max(1);
            log::info!(
                "Avg frame rate: {:.2}",
                frames as f32 / (elapsed as f32 / 1000.0)
            );

            let palette = presenter.palette();
            let first = palette.get(0);
            for i in 1..16u8 {
                palette.set(i - 1, palette.get(i));
            }
            palette.set(15, first);
        }

        delay(10);
    }

    presenter.request_termination_and_wait();
    log::info!("Display window closed.");
    Ok(())
}
