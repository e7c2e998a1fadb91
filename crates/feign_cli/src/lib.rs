use std::path::{Path, PathBuf};

use feign_engine::{load_config, EngineConfig, FakeMessageGenerator, FeignRng};

pub const DEFAULT_CONFIG_PATH: &str = "assets/feign.xml";
pub const DEFAULT_SAMPLE_COUNT: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the loaded sections and tuning of a config file.
    Inspect { config: PathBuf },
    /// Generate sample messages from a config file.
    Sample {
        config: PathBuf,
        category: String,
        count: u32,
        seed: Option<u64>,
    },
}

pub fn parse_args(args: &[String]) -> Result<Command, String> {
    let Some((command, rest)) = args.split_first() else {
        return Err("missing command".to_string());
    };

    // Options are scoped to their command; a flag the command does not take
    // is an error, not silently ignored.
    match command.as_str() {
        "inspect" => parse_inspect_args(rest),
        "sample" => parse_sample_args(rest),
        other => Err(format!("unknown command '{other}'")),
    }
}

fn parse_inspect_args(rest: &[String]) -> Result<Command, String> {
    let mut config = PathBuf::from(DEFAULT_CONFIG_PATH);

    let mut index = 0usize;
    while index < rest.len() {
        match rest[index].as_str() {
            "--config" => {
                config = PathBuf::from(option_value(rest, index, "--config")?);
                index += 2;
            }
            other => return Err(format!("unknown option '{other}' for inspect")),
        }
    }

    Ok(Command::Inspect { config })
}

fn parse_sample_args(rest: &[String]) -> Result<Command, String> {
    let mut config = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut category = "generic".to_string();
    let mut count = DEFAULT_SAMPLE_COUNT;
    let mut seed: Option<u64> = None;

    let mut index = 0usize;
    while index < rest.len() {
        match rest[index].as_str() {
            "--config" => {
                config = PathBuf::from(option_value(rest, index, "--config")?);
                index += 2;
            }
            "--category" => {
                category = option_value(rest, index, "--category")?.clone();
                index += 2;
            }
            "--count" => {
                let value = option_value(rest, index, "--count")?;
                count = value
                    .parse::<u32>()
                    .map_err(|_| format!("invalid --count value '{value}' (expected u32)"))?;
                index += 2;
            }
            "--seed" => {
                let value = option_value(rest, index, "--seed")?;
                seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("invalid --seed value '{value}' (expected u64)"))?,
                );
                index += 2;
            }
            other => return Err(format!("unknown option '{other}' for sample")),
        }
    }

    Ok(Command::Sample {
        config,
        category,
        count,
        seed,
    })
}

fn option_value<'a>(rest: &'a [String], index: usize, name: &str) -> Result<&'a String, String> {
    rest.get(index + 1)
        .ok_or_else(|| format!("missing value for {name}"))
}

pub fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Inspect { config } => run_inspect(&config),
        Command::Sample {
            config,
            category,
            count,
            seed,
        } => run_sample(&config, &category, count, seed),
    }
}

fn run_inspect(config_path: &Path) -> Result<(), String> {
    let config = load_config(config_path).map_err(|error| error.to_string())?;
    println!("{}", render_inspect(&config));
    Ok(())
}

pub fn render_inspect(config: &EngineConfig) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "template categories: {}\n",
        config.templates.len()
    ));
    for (category, templates) in &config.templates {
        output.push_str(&format!("  {category}: {} template(s)\n", templates.len()));
    }
    output.push_str(&format!("component keys: {}\n", config.components.len()));
    for (key, values) in &config.components {
        output.push_str(&format!("  {key}: {} value(s)\n", values.len()));
    }
    output.push_str(&format!(
        "tuning: stall_probability={} jump_factor=[{}, {}) default_stuck_at={} \
nested_child_count={} bar_width={} bar_fill='{}'\n",
        config.tuning.stall_probability,
        config.tuning.jump_factor_min,
        config.tuning.jump_factor_max,
        config.tuning.default_stuck_at,
        config.tuning.nested_child_count,
        config.tuning.bar_width,
        config.tuning.bar_fill,
    ));
    output.push_str(&format!(
        "weights: reliable={} unreliable={} stuck={} nested={}",
        config.weights.reliable,
        config.weights.unreliable,
        config.weights.stuck,
        config.weights.nested,
    ));
    output
}

fn run_sample(
    config_path: &Path,
    category: &str,
    count: u32,
    seed: Option<u64>,
) -> Result<(), String> {
    let config = load_config(config_path).map_err(|error| error.to_string())?;
    let rng = match seed {
        Some(seed) => FeignRng::seeded(seed),
        None => FeignRng::from_os(),
    };
    let mut generator = FakeMessageGenerator::new(rng);
    generator.load_from_config(&config);

    for _ in 0..count {
        let message = generator.generate(category);
        println!("[{}] {}", message.severity.to_uppercase(), message.text);
    }
    Ok(())
}
