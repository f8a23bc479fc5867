use std::fmt;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Deserialize, Serialize)]
pub enum EnergyModel {
    #[serde(rename = "linear")]
    Linear = 0,
    #[serde(rename = "non-linear")]
    NonLinear = 1,
    #[serde(rename = "endurance")]
    Endurance = 2,
    #[serde(rename = "unlimited")]
    Unlimited = 3,
}

impl fmt::Display for EnergyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Linear => "linear",
                Self::NonLinear => "non-linear",
                Self::Endurance => "endurance",
                Self::Unlimited => "unlimited",
            }
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Deserialize, Serialize)]
pub enum ConfigType {
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "high")]
    High,
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Low => "low",
                Self::High => "high",
            }
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Deserialize, Serialize)]
pub enum DistanceType {
    #[serde(rename = "manhattan")]
    Manhattan,
    #[serde(rename = "euclidean")]
    Euclidean,
}

impl fmt::Display for DistanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Manhattan => "manhattan",
                Self::Euclidean => "euclidean",
            }
        )
    }
}

impl DistanceType {
    pub fn matrix(&self, x: &[f64], y: &[f64]) -> Vec<Vec<f64>> {
        let n = x.len();
        assert_eq!(n, y.len());

        let mut matrix = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                let dx = x[i] - x[j];
                let dy = y[i] - y[j];
                matrix[i][j] = match self {
                    Self::Manhattan => dx.abs() + dy.abs(),
                    Self::Euclidean => (dx * dx + dy * dy).sqrt(),
                };
            }
        }

        matrix
    }
}

/// Which precomputed priority function orders the propagation frontier (§6).
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
pub enum PropagationPriority {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "min-distance")]
    MinDistance,
    #[serde(rename = "max-distance")]
    MaxDistance,
    #[serde(rename = "ideal-distance")]
    IdealDistance,
    #[serde(rename = "min-distance-no-normalize")]
    MinDistanceNoNormalize,
    #[serde(rename = "max-distance-no-normalize")]
    MaxDistanceNoNormalize,
    #[serde(rename = "ideal-distance-no-normalize")]
    IdealDistanceNoNormalize,
}

impl fmt::Display for PropagationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::None => "none",
                Self::MinDistance => "min-distance",
                Self::MaxDistance => "max-distance",
                Self::IdealDistance => "ideal-distance",
                Self::MinDistanceNoNormalize => "min-distance-no-normalize",
                Self::MaxDistanceNoNormalize => "max-distance-no-normalize",
                Self::IdealDistanceNoNormalize => "ideal-distance-no-normalize",
            }
        )
    }
}

#[derive(Debug, Parser)]
#[command(
    long_about = "The Pareto-optimal parallel technician-and-drone scheduling tabu search for door-to-door delivery",
    propagate_version = true,
    version
)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Commands,
}

#[allow(clippy::large_enum_variant)] // This struct is mostly a singleton
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Recompute the cost and feasibility of a previously dumped solution
    Evaluate {
        /// Path to the solution JSON file
        solution: String,

        /// Path to the config JSON file
        config: String,
    },

    /// Run the tabu search
    Run {
        /// Path to the problem text file
        problem: String,

        /// Path to truck config file
        #[arg(long, default_value_t = String::from("problems/config_parameter/truck_config.json"))]
        truck_cfg: String,

        /// Path to drone config file
        #[arg(long, default_value_t = String::from("problems/config_parameter/drone_endurance_config.json"))]
        drone_cfg: String,

        /// The energy consumption model to use.
        #[arg(short, long, default_value_t = EnergyModel::Endurance)]
        config: EnergyModel,

        /// Speed type of drones.
        #[arg(long, default_value_t = ConfigType::High)]
        speed_type: ConfigType,

        /// Range type of drones.
        #[arg(long, default_value_t = ConfigType::High)]
        range_type: ConfigType,

        /// Distance type to use for trucks.
        #[arg(long, default_value_t = DistanceType::Euclidean)]
        truck_distance: DistanceType,

        /// Distance type to use for drones.
        #[arg(long, default_value_t = DistanceType::Euclidean)]
        drone_distance: DistanceType,

        /// The number of trucks to override. Otherwise, use the problem file's header.
        #[arg(long)]
        trucks_count: Option<usize>,

        /// The number of drones to override. Otherwise, use the problem file's header.
        #[arg(long)]
        drones_count: Option<usize>,

        /// Number of tabu-search iterations to run (the driver always runs to completion).
        #[arg(long, default_value_t = 200)]
        iterations_count: usize,

        /// Tabu registry capacity, per neighborhood class.
        #[arg(long, default_value_t = 30)]
        tabu_size: usize,

        /// Maximum number of solutions propagated to the next iteration.
        #[arg(long, default_value_t = 8)]
        max_propagation: usize,

        /// Ordering applied to the propagation frontier each iteration.
        #[arg(long, default_value_t = PropagationPriority::None)]
        propagation_priority: PropagationPriority,

        /// Size of the shared worker pool. Defaults to the number of logical CPUs.
        #[arg(long)]
        workers: Option<usize>,

        /// The verbose mode
        #[arg(short, long)]
        verbose: bool,

        /// The directory to store results
        #[arg(long, default_value_t = String::from("outputs/"))]
        outputs: String,

        /// Disable CSV logging per iteration (this can significantly reduce the running time)
        #[arg(long)]
        disable_logging: bool,

        /// Do not run the algorithm, only generate the config file
        #[arg(long)]
        dry_run: bool,

        /// Extra data to store in the output JSON
        #[arg(long, default_value_t = String::new())]
        extra: String,
    },
}
