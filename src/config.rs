use std::f64::consts;
use std::fs;
use std::sync::LazyLock;

use clap::Parser;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::cli;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TruckConfig {
    #[serde(rename = "V_max (m/s)")]
    pub speed: f64,

    #[serde(rename = "M_t (kg)")]
    pub capacity: f64,

    /// Cyclic per-hour velocity coefficients; the truck's effective speed
    /// during the k-th hour since it started is `speed * coef[k % coef.len()]`.
    #[serde(rename = "T (hour)", default = "TruckConfig::default_coef")]
    pub coef: Vec<f64>,
}

impl TruckConfig {
    fn default_coef() -> Vec<f64> {
        vec![1.0]
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LinearJSON {
    #[serde(rename = "takeoffSpeed [m/s]")]
    takeoff_speed: f64,

    #[serde(rename = "cruiseSpeed [m/s]")]
    cruise_speed: f64,

    #[serde(rename = "landingSpeed [m/s]")]
    landing_speed: f64,

    #[serde(rename = "cruiseAlt [m]")]
    altitude: f64,

    #[serde(rename = "capacity [kg]")]
    capacity: f64,

    #[serde(rename = "batteryPower [Joule]")]
    battery: f64,

    speed_type: cli::ConfigType,
    range_type: cli::ConfigType,

    #[serde(rename = "beta(w/kg)")]
    beta: f64,

    #[serde(rename = "gamma(w)")]
    gamma: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NonLinearJSON {
    #[serde(rename = "takeoffSpeed [m/s]")]
    takeoff_speed: f64,

    #[serde(rename = "cruiseSpeed [m/s]")]
    cruise_speed: f64,

    #[serde(rename = "landingSpeed [m/s]")]
    landing_speed: f64,

    #[serde(rename = "cruiseAlt [m]")]
    altitude: f64,

    #[serde(rename = "capacity [kg]")]
    capacity: f64,

    #[serde(rename = "batteryPower [Joule]")]
    battery: f64,

    speed_type: cli::ConfigType,
    range_type: cli::ConfigType,
}

#[derive(Debug, Deserialize)]
struct NonLinearFileJSON {
    config: Vec<NonLinearJSON>,
    k1: f64,

    #[serde(rename = "k2 (sqrt(kg/m))")]
    k2: f64,

    #[serde(rename = "c1 (sqrt(m/kg))")]
    c1: f64,

    #[serde(rename = "c2 (sqrt(m/kg))")]
    c2: f64,

    #[serde(rename = "c4 (kg/m)")]
    c4: f64,

    #[serde(rename = "c5 (Ns/m)")]
    c5: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EnduranceJSON {
    speed_type: cli::ConfigType,
    range_type: cli::ConfigType,

    #[serde(rename = "capacity [kg]")]
    capacity: f64,

    #[serde(rename = "FixedTime (s)")]
    fixed_time: f64,

    #[serde(rename = "FixedDistance (m)", default = "EnduranceJSON::default_range")]
    fixed_distance: f64,

    #[serde(rename = "Drone_speed (m/s)")]
    speed: f64,
}

impl EnduranceJSON {
    fn default_range() -> f64 {
        f64::INFINITY
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "config")]
pub enum DroneConfig {
    Linear {
        data: LinearJSON,
        takeoff_time: f64,
        landing_time: f64,
    },
    NonLinear {
        data: NonLinearJSON,
        vert_k1: f64,
        vert_k2: f64,
        vert_c2: f64,
        vert_half_takeoff: f64,
        vert_half_landing: f64,
        vert_half_takeoff_2: f64,
        vert_half_landing_2: f64,
        hori_c12: f64,
        hori_c4v3: f64,
        hori_c42v4: f64,
        hori_c5: f64,
        takeoff_time: f64,
        landing_time: f64,
    },
    Endurance {
        data: EnduranceJSON,
    },
}

impl DroneConfig {
    const W: f64 = 1.5;
    const G: f64 = 9.8;

    fn new(path: &str, config: cli::EnergyModel, speed_type: cli::ConfigType, range_type: cli::ConfigType) -> Self {
        match config {
            cli::EnergyModel::Linear => {
                let data = serde_json::from_str::<Vec<LinearJSON>>(&fs::read_to_string(path).unwrap()).unwrap();

                for config in data {
                    if config.speed_type == speed_type && config.range_type == range_type {
                        let takeoff_time = config.altitude / config.takeoff_speed;
                        let landing_time = config.altitude / config.landing_speed;
                        return Self::Linear {
                            data: config,
                            takeoff_time,
                            landing_time,
                        };
                    }
                }

                panic!("No matching linear config")
            }
            cli::EnergyModel::NonLinear => {
                let data = serde_json::from_str::<NonLinearFileJSON>(&fs::read_to_string(path).unwrap()).unwrap();

                for config in data.config {
                    if config.speed_type == speed_type && config.range_type == range_type {
                        let vert_k1 = data.k1 * Self::G;
                        let vert_k2 = Self::G / (data.k2 * data.k2);
                        let vert_c2 = data.c2 * Self::G.powf(1.5);
                        let vert_half_takeoff: f64 = config.takeoff_speed / 2.0;
                        let vert_half_landing = config.landing_speed / 2.0;
                        let vert_half_takeoff_2 = vert_half_takeoff * vert_half_takeoff;
                        let vert_half_landing_2 = vert_half_landing * vert_half_landing;
                        let hori_c12 = data.c1 + data.c2;
                        let hori_c4v3 = data.c4 * config.cruise_speed * config.cruise_speed * config.cruise_speed;
                        let hori_c42v4 = data.c4
                            * data.c4
                            * config.cruise_speed
                            * config.cruise_speed
                            * config.cruise_speed
                            * config.cruise_speed;

                        let deg_10 = consts::PI / 18.0;
                        let hori_c5 = data.c5 * (config.cruise_speed * deg_10.cos()).powi(2);

                        let takeoff_time = config.altitude / config.takeoff_speed;
                        let landing_time = config.altitude / config.landing_speed;

                        return Self::NonLinear {
                            data: config,
                            vert_k1,
                            vert_k2,
                            vert_c2,
                            vert_half_takeoff,
                            vert_half_landing,
                            vert_half_takeoff_2,
                            vert_half_landing_2,
                            hori_c12,
                            hori_c4v3,
                            hori_c42v4,
                            hori_c5,
                            takeoff_time,
                            landing_time,
                        };
                    }
                }

                panic!("No matching non-linear config")
            }
            cli::EnergyModel::Endurance => {
                let data = serde_json::from_str::<Vec<EnduranceJSON>>(&fs::read_to_string(path).unwrap()).unwrap();

                for config in data {
                    if config.speed_type == speed_type && config.range_type == range_type {
                        return Self::Endurance { data: config };
                    }
                }

                panic!("No matching endurance config")
            }
            cli::EnergyModel::Unlimited => Self::Endurance {
                data: EnduranceJSON {
                    speed_type: cli::ConfigType::High,
                    range_type: cli::ConfigType::High,
                    capacity: f64::INFINITY,
                    fixed_time: f64::INFINITY,
                    fixed_distance: f64::INFINITY,
                    speed: 1.0,
                },
            },
        }
    }

    pub fn capacity(&self) -> f64 {
        match self {
            Self::Linear { data, .. } => data.capacity,
            Self::NonLinear { data, .. } => data.capacity,
            Self::Endurance { data, .. } => data.capacity,
        }
    }

    pub fn battery(&self) -> f64 {
        match self {
            Self::Linear { data, .. } => data.battery,
            Self::NonLinear { data, .. } => data.battery,
            Self::Endurance { .. } => f64::INFINITY,
        }
    }

    pub fn fixed_time(&self) -> f64 {
        match self {
            Self::Linear { .. } | Self::NonLinear { .. } => f64::INFINITY,
            Self::Endurance { data, .. } => data.fixed_time,
        }
    }

    pub fn fixed_distance(&self) -> f64 {
        match self {
            Self::Linear { .. } | Self::NonLinear { .. } => f64::INFINITY,
            Self::Endurance { data, .. } => data.fixed_distance,
        }
    }

    pub fn uses_energy_model(&self) -> bool {
        matches!(self, Self::Linear { .. } | Self::NonLinear { .. })
    }

    pub fn takeoff_power(&self, weight: f64) -> f64 {
        match self {
            Self::Linear { data, .. } => data.beta.mul_add(weight, data.gamma),
            Self::NonLinear {
                vert_k1,
                vert_k2,
                vert_c2,
                vert_half_takeoff,
                vert_half_takeoff_2,
                ..
            } => {
                let w = Self::W + weight;
                (vert_k1 * w).mul_add(
                    vert_half_takeoff + (vert_half_takeoff_2 + vert_k2 * w).sqrt(),
                    vert_c2 * w.powf(1.5),
                )
            }
            Self::Endurance { .. } => 0.0,
        }
    }

    pub fn landing_power(&self, weight: f64) -> f64 {
        match self {
            Self::Linear { data, .. } => data.beta.mul_add(weight, data.gamma),
            Self::NonLinear {
                vert_k1,
                vert_k2,
                vert_c2,
                vert_half_landing,
                vert_half_landing_2,
                ..
            } => {
                let w = Self::W + weight;
                (vert_k1 * w).mul_add(
                    vert_half_landing + (vert_half_landing_2 + vert_k2 * w).sqrt(),
                    vert_c2 * w.powf(1.5),
                )
            }
            Self::Endurance { .. } => 0.0,
        }
    }

    pub fn cruise_power(&self, weight: f64) -> f64 {
        match self {
            Self::Linear { data, .. } => data.beta.mul_add(weight, data.gamma),
            Self::NonLinear {
                hori_c12,
                hori_c4v3,
                hori_c42v4,
                hori_c5,
                ..
            } => {
                let temp = (Self::W + weight) * Self::G - hori_c5;
                hori_c12 * (temp * temp + hori_c42v4).powf(0.75) + hori_c4v3
            }
            Self::Endurance { .. } => 0.0,
        }
    }

    pub fn takeoff_time(&self) -> f64 {
        match self {
            Self::Linear { takeoff_time, .. } | Self::NonLinear { takeoff_time, .. } => *takeoff_time,
            Self::Endurance { .. } => 0.0,
        }
    }

    pub fn landing_time(&self) -> f64 {
        match self {
            Self::Linear { landing_time, .. } | Self::NonLinear { landing_time, .. } => *landing_time,
            Self::Endurance { .. } => 0.0,
        }
    }

    pub fn cruise_time(&self, distance: f64) -> f64 {
        match self {
            Self::Linear { data, .. } => distance / data.cruise_speed,
            Self::NonLinear { data, .. } => distance / data.cruise_speed,
            Self::Endurance { data, .. } => distance / data.speed,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SerializedConfig {
    pub customers_count: usize,
    pub trucks_count: usize,
    pub drones_count: usize,

    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub demands: Vec<f64>,
    pub dronable: Vec<bool>,
    pub service_time_drone: Vec<f64>,
    pub service_time_tech: Vec<f64>,

    pub truck_distance: cli::DistanceType,
    pub drone_distance: cli::DistanceType,

    pub truck: TruckConfig,
    pub drone: DroneConfig,

    pub problem: String,
    pub config: cli::EnergyModel,
    pub iterations_count: usize,
    pub tabu_size: usize,
    pub max_propagation: usize,
    pub propagation_priority: cli::PropagationPriority,
    pub workers: usize,
    pub speed_type: cli::ConfigType,
    pub range_type: cli::ConfigType,
    pub verbose: bool,
    pub outputs: String,
    pub disable_logging: bool,
    pub dry_run: bool,
    pub extra: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub customers_count: usize,
    pub trucks_count: usize,
    pub drones_count: usize,

    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub demands: Vec<f64>,
    pub dronable: Vec<bool>,
    pub service_time_drone: Vec<f64>,
    pub service_time_tech: Vec<f64>,

    pub truck_distance: cli::DistanceType,
    pub drone_distance: cli::DistanceType,
    pub truck_distances: Vec<Vec<f64>>,
    pub drone_distances: Vec<Vec<f64>>,

    pub truck: TruckConfig,
    pub drone: DroneConfig,

    pub problem: String,
    pub config: cli::EnergyModel,
    pub iterations_count: usize,
    pub tabu_size: usize,
    pub max_propagation: usize,
    pub propagation_priority: cli::PropagationPriority,
    pub workers: usize,
    pub speed_type: cli::ConfigType,
    pub range_type: cli::ConfigType,
    pub verbose: bool,
    pub outputs: String,
    pub disable_logging: bool,
    pub dry_run: bool,
    pub extra: String,
}

impl From<SerializedConfig> for Config {
    fn from(config: SerializedConfig) -> Self {
        let truck_distances = config.truck_distance.matrix(&config.x, &config.y);
        let drone_distances = config.drone_distance.matrix(&config.x, &config.y);

        Self {
            customers_count: config.customers_count,
            trucks_count: config.trucks_count,
            drones_count: config.drones_count,
            x: config.x,
            y: config.y,
            demands: config.demands,
            dronable: config.dronable,
            service_time_drone: config.service_time_drone,
            service_time_tech: config.service_time_tech,
            truck_distance: config.truck_distance,
            drone_distance: config.drone_distance,
            truck_distances,
            drone_distances,
            truck: config.truck,
            drone: config.drone,
            problem: config.problem,
            config: config.config,
            iterations_count: config.iterations_count,
            tabu_size: config.tabu_size,
            max_propagation: config.max_propagation,
            propagation_priority: config.propagation_priority,
            workers: config.workers,
            speed_type: config.speed_type,
            range_type: config.range_type,
            verbose: config.verbose,
            outputs: config.outputs,
            disable_logging: config.disable_logging,
            dry_run: config.dry_run,
            extra: config.extra,
        }
    }
}

impl From<Config> for SerializedConfig {
    fn from(config: Config) -> Self {
        Self {
            customers_count: config.customers_count,
            trucks_count: config.trucks_count,
            drones_count: config.drones_count,
            x: config.x,
            y: config.y,
            demands: config.demands,
            dronable: config.dronable,
            service_time_drone: config.service_time_drone,
            service_time_tech: config.service_time_tech,
            truck_distance: config.truck_distance,
            drone_distance: config.drone_distance,
            truck: config.truck,
            drone: config.drone,
            problem: config.problem,
            config: config.config,
            iterations_count: config.iterations_count,
            tabu_size: config.tabu_size,
            max_propagation: config.max_propagation,
            propagation_priority: config.propagation_priority,
            workers: config.workers,
            speed_type: config.speed_type,
            range_type: config.range_type,
            verbose: config.verbose,
            outputs: config.outputs,
            disable_logging: config.disable_logging,
            dry_run: config.dry_run,
            extra: config.extra,
        }
    }
}

impl Config {
    /// Effective truck velocity after `elapsed` seconds of truck time since
    /// it left the depot (service time counts toward elapsed time); cycles
    /// through `truck.coef` every 3600s window (§4.1).
    pub fn truck_speed_at(&self, elapsed: f64) -> f64 {
        let hour = (elapsed / 3600.0).floor() as usize;
        let coef = self.truck.coef[hour % self.truck.coef.len()];
        self.truck.speed * coef
    }
}

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    let arguments = cli::Arguments::parse();
    eprintln!("Received {arguments:?}");
    match arguments.command {
        cli::Commands::Evaluate { config, .. } => {
            let data = fs::read_to_string(config).unwrap();
            let deserialized = serde_json::from_str::<SerializedConfig>(&data).unwrap();
            Config::from(deserialized)
        }
        cli::Commands::Run {
            problem,
            truck_cfg,
            drone_cfg,
            config,
            speed_type,
            range_type,
            truck_distance,
            drone_distance,
            trucks_count,
            drones_count,
            iterations_count,
            tabu_size,
            max_propagation,
            propagation_priority,
            workers,
            verbose,
            outputs,
            disable_logging,
            dry_run,
            extra,
        } => {
            let customers_header = Regex::new(r"Customers (\d+)").unwrap();
            let number_drone_header = Regex::new(r"number_drone (\d+)").unwrap();
            let trucks_count_regex = Regex::new(r"trucks_count (\d+)").unwrap();
            let depot_regex = Regex::new(r"depot (-?[\d.]+)\s+(-?[\d.]+)").unwrap();
            let customers_regex = RegexBuilder::new(
                r"^\s*(-?[\d.]+)\s+(-?[\d.]+)\s+([\d.]+)\s+(0|1)\s+([\d.]+)\s+([\d.]+)\s*$",
            )
            .multi_line(true)
            .build()
            .unwrap();

            let data = fs::read_to_string(&problem).unwrap();

            let drones_count = drones_count
                .or_else(|| {
                    number_drone_header
                        .captures(&data)
                        .and_then(|caps| caps.get(1))
                        .and_then(|m| m.as_str().parse::<usize>().ok())
                })
                .expect("Missing number_drone header");
            let trucks_count = trucks_count
                .or_else(|| {
                    trucks_count_regex
                        .captures(&data)
                        .and_then(|caps| caps.get(1))
                        .and_then(|m| m.as_str().parse::<usize>().ok())
                })
                .unwrap_or(1);
            let declared_customers = customers_header
                .captures(&data)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<usize>().ok());

            let depot = depot_regex
                .captures(&data)
                .and_then(|caps| {
                    let x = caps.get(1)?.as_str().parse::<f64>().ok()?;
                    let y = caps.get(2)?.as_str().parse::<f64>().ok()?;
                    Some((x, y))
                })
                .unwrap_or((0.0, 0.0));

            let mut customers_count = 0;
            let mut x = vec![depot.0];
            let mut y = vec![depot.1];
            let mut demands = vec![0.0];
            let mut dronable = vec![true];
            let mut service_time_tech = vec![0.0];
            let mut service_time_drone = vec![0.0];
            for c in customers_regex.captures_iter(&data) {
                customers_count += 1;

                let (_, [_x, _y, _demand, _technician_only, _svc_tech, _svc_drone]) = c.extract::<6>();
                x.push(_x.parse::<f64>().unwrap());
                y.push(_y.parse::<f64>().unwrap());
                demands.push(_demand.parse::<f64>().unwrap());
                dronable.push(matches!(_technician_only, "0"));
                service_time_tech.push(_svc_tech.parse::<f64>().unwrap());
                service_time_drone.push(_svc_drone.parse::<f64>().unwrap());
            }
            if let Some(declared) = declared_customers {
                assert_eq!(declared, customers_count, "Customers header disagrees with row count");
            }

            let truck_distances = truck_distance.matrix(&x, &y);
            let drone_distances = drone_distance.matrix(&x, &y);

            let truck = serde_json::from_str::<TruckConfig>(&fs::read_to_string(truck_cfg).unwrap()).unwrap();
            let drone = DroneConfig::new(&drone_cfg, config, speed_type, range_type);

            let takeoff = drone.takeoff_time();
            let takeoff_from_depot = drone.takeoff_power(0.0);

            let landing = drone.landing_time();
            let landing_from_depot = drone.landing_power(0.0);

            let cruise_from_depot = drone.cruise_power(0.0);
            for i in 1..customers_count + 1 {
                let round_trip_energy = (landing_from_depot + drone.landing_power(demands[i])).mul_add(
                    landing,
                    drone.cruise_power(demands[i]).mul_add(
                        drone.cruise_time(drone_distances[i][0]),
                        (takeoff_from_depot + drone.takeoff_power(demands[i]))
                            .mul_add(takeoff, cruise_from_depot * drone.cruise_time(drone_distances[0][i])),
                    ),
                );

                dronable[i] = dronable[i]
                    && demands[i] <= drone.capacity()
                    && takeoff + drone.cruise_time(drone_distances[0][i] + drone_distances[i][0]) + landing
                        <= drone.fixed_time()
                    && drone_distances[0][i] <= drone.fixed_distance()
                    && round_trip_energy <= drone.battery();
            }

            let workers = workers.unwrap_or_else(num_cpus::get);

            Config {
                customers_count,
                trucks_count,
                drones_count,
                x,
                y,
                demands,
                dronable,
                service_time_drone,
                service_time_tech,
                truck_distance,
                drone_distance,
                truck_distances,
                drone_distances,
                truck,
                drone,
                problem,
                config,
                iterations_count,
                tabu_size,
                max_propagation,
                propagation_priority,
                workers,
                speed_type,
                range_type,
                verbose,
                outputs,
                disable_logging,
                dry_run,
                extra,
            }
        }
    }
});
