//! Run-output writer: one CSV row per expanded candidate (disabled via
//! `--disable-logging`, same as the teacher), plus a final JSON dump of the
//! whole Pareto front instead of the teacher's single best `Solution`.

use std::error::Error;
use std::fs::{self, File};
use std::io;
use std::io::Write;
use std::path::Path;
use std::time::SystemTime;

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Serialize;

use crate::config::{CONFIG, SerializedConfig};
use crate::errors::expect_field;
use crate::neighborhoods::Neighborhood;
use crate::pareto::ParetoSet;
use crate::solutions::Solution;

#[derive(Serialize)]
struct SolutionRecord<'a> {
    cost: [f64; 2],
    drone_paths: &'a Vec<Vec<Vec<usize>>>,
    technician_paths: &'a Vec<Vec<usize>>,
}

#[derive(Serialize)]
struct RunJSON<'a> {
    problem: String,
    iterations_count: usize,
    tabu_size: usize,
    max_propagation: usize,
    propagation_priority: String,
    solutions: Vec<SolutionRecord<'a>>,
    config: &'a SerializedConfig,
    elapsed: f64,
}

pub struct Logger {
    iteration: usize,
    time_offset: SystemTime,

    outputs: std::path::PathBuf,
    problem: String,
    id: String,
    writer: Option<File>,
}

impl Logger {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let outputs = Path::new(&CONFIG.outputs);
        if !outputs.is_dir() {
            fs::create_dir_all(outputs)?;
        }

        let problem = expect_field(
            Path::new(&CONFIG.problem).file_stem().and_then(|f| f.to_os_string().into_string().ok()),
            &CONFIG.problem,
            "file stem",
        )?;
        let id = rand::rng().sample_iter(&Alphanumeric).take(8).map(char::from).collect::<String>();

        let mut writer = if CONFIG.disable_logging {
            None
        } else {
            Some(File::create(outputs.join(format!("{problem}-{id}.csv")))?)
        };

        if let Some(ref mut writer) = writer {
            eprintln!("Logging iterations to {writer:?}");
            let columns = ["Iteration", "Timespan", "Waiting", "Violation", "Neighborhood"].join(",");
            writeln!(writer, "sep=,\n{columns}")?;
        }

        Ok(Logger {
            iteration: 0,
            time_offset: SystemTime::now(),
            outputs: outputs.to_path_buf(),
            id,
            problem,
            writer,
        })
    }

    pub fn log(&mut self, solution: &Solution, neighbor: Neighborhood, violation: f64) -> Result<(), io::Error> {
        self.iteration += 1;
        if let Some(ref mut writer) = self.writer {
            writeln!(
                writer,
                "{},{},{},{},\"{}\"",
                self.iteration, solution.cost[0], solution.cost[1], violation, neighbor,
            )?;
        }
        Ok(())
    }

    pub fn finalize(&self, front: &ParetoSet<Solution>) -> Result<(), Box<dyn Error>> {
        let elapsed = SystemTime::now().duration_since(self.time_offset).unwrap().as_secs_f64();
        let serialized_config = SerializedConfig::from(CONFIG.clone());

        let solutions: Vec<SolutionRecord> = front
            .iter()
            .map(|s| SolutionRecord {
                cost: s.cost,
                drone_paths: &s.drone_paths,
                technician_paths: &s.tech_paths,
            })
            .collect();

        let json_path = self.outputs.join(format!("{}-{}.json", self.problem, self.id));
        let mut json = File::create(&json_path)?;
        println!("{}", json_path.display());
        json.write_all(
            serde_json::to_string(&RunJSON {
                problem: self.problem.clone(),
                iterations_count: CONFIG.iterations_count,
                tabu_size: CONFIG.tabu_size,
                max_propagation: CONFIG.max_propagation,
                propagation_priority: CONFIG.propagation_priority.to_string(),
                solutions,
                config: &serialized_config,
                elapsed,
            })?
            .as_bytes(),
        )?;

        let json_path = self.outputs.join(format!("{}-{}-config.json", self.problem, self.id));
        let mut json = File::create(&json_path)?;
        println!("{}", json_path.display());
        json.write_all(serde_json::to_string(&serialized_config)?.as_bytes())?;

        Ok(())
    }
}
