use crate::input::headset::{HeadsetProbe, NoHeadset, SimulatedHeadset};
use crate::plot::PlotSize;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// `vrworld-viewer` - Interactive VR point-cloud view of a saved world's dataset.
///
/// Loads the tabular dataset stored in a world file, plots three of its
/// columns as a normalized point cloud with reference axes, and lets the user
/// navigate and select points with keyboard, mouse or a VR headset.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Path to the saved world (JSON).
    ///
    /// Either a bare array of raw dataset rows, or a scene object whose
    /// `userData` (or `object.userData`) holds them.
    #[arg(long, env = "VRWORLD_WORLD_PATH")]
    pub world_path: PathBuf,

    /// World-space length of the X axis.
    #[arg(long, env = "VRWORLD_PLOT_X", default_value_t = 10.0)]
    pub plot_x: f32,

    /// World-space length of the Y axis.
    #[arg(long, env = "VRWORLD_PLOT_Y", default_value_t = 5.0)]
    pub plot_y: f32,

    /// World-space length of the Z axis.
    #[arg(long, env = "VRWORLD_PLOT_Z", default_value_t = 10.0)]
    pub plot_z: f32,

    /// Point size as a fraction of the largest axis length.
    #[arg(long, env = "VRWORLD_POINT_SIZE_COEFF", default_value_t = 0.01)]
    pub point_size_coeff: f32,

    /// Which headset backend to probe at startup.
    #[arg(long, env = "VRWORLD_HEADSET", value_enum, default_value_t = HeadsetMode::None)]
    pub headset: HeadsetMode,

    /// Display refresh rate reported by the simulated headset (Hz).
    #[arg(long, env = "VRWORLD_SIM_REFRESH_HZ", default_value_t = 90.0)]
    pub sim_refresh_hz: f32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadsetMode {
    /// No headset; the window drives frames.
    None,
    /// A fake display that always connects.
    Simulated,
}

impl Config {
    pub fn plot_size(&self) -> PlotSize {
        PlotSize {
            x: self.plot_x,
            y: self.plot_y,
            z: self.plot_z,
            point_size_coeff: self.point_size_coeff,
        }
    }

    pub fn headset_probe(&self) -> Box<dyn HeadsetProbe> {
        match self.headset {
            HeadsetMode::None => Box::new(NoHeadset),
            HeadsetMode::Simulated => Box::new(SimulatedHeadset::new(self.sim_refresh_hz)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_plot_defaults() {
        let cfg = Config::try_parse_from(["vrworld-viewer", "--world-path", "w.json"]).unwrap();
        assert_eq!(cfg.plot_size(), PlotSize::default());
        assert_eq!(cfg.headset, HeadsetMode::None);
    }

    #[test]
    fn headset_mode_parses() {
        let cfg = Config::try_parse_from([
            "vrworld-viewer",
            "--world-path",
            "w.json",
            "--headset",
            "simulated",
            "--plot-y",
            "8",
        ])
        .unwrap();
        assert_eq!(cfg.headset, HeadsetMode::Simulated);
        assert_eq!(cfg.plot_size().y, 8.0);
    }
}
