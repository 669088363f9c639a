//! Scene construction at startup.

use crate::data::DatasetSource;
use crate::input::headset::HeadsetProbe;
use crate::input::DeviceInput;
use crate::plot::PlotSize;
use crate::scheduler::FrameScheduler;
use crate::session::SessionContext;

/// A constructed, running visualization.
pub struct Visualization {
    pub session: SessionContext,
    pub input: DeviceInput,
    pub scheduler: FrameScheduler,
}

/// Builds the session from `source` and starts the frame loop.
///
/// Nothing here is fatal: a missing dataset or a failed draw leaves an empty
/// but navigable scene, and the headset probe resolves later on its own.
pub fn bootstrap(
    source: &dyn DatasetSource,
    probe: Box<dyn HeadsetProbe>,
    viewport: (u32, u32),
    plot_size: PlotSize,
) -> Visualization {
    let dataset = match source.fetch() {
        Ok(ds) => {
            log::info!(
                "Loaded dataset: {} records x {} columns, default axes {:?}",
                ds.len(),
                ds.column_count(),
                ds.default_axes()
            );
            Some(ds)
        }
        Err(e) => {
            log::error!("Failed to load dataset: {}", e);
            None
        }
    };

    let mut session = SessionContext::new(viewport, plot_size);
    let input = DeviceInput::new();
    session.install_decoration();

    session.vr.start_probe(probe);

    if let Some(ds) = dataset {
        let axes = ds.default_axes();
        session.dataset = Some(ds);
        if let Err(e) = session.draw_dataset(axes) {
            log::error!("Failed to draw dataset on columns {:?}: {}", axes, e);
        }
    }

    session.place_camera_for_plot();
    session.trackball.target = plot_size.center();
    session.keyboard_enabled = true;

    let mut scheduler = FrameScheduler::new();
    scheduler.start();

    Visualization {
        session,
        input,
        scheduler,
    }
}
