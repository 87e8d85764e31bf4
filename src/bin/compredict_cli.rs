//! compredict-cli — AI Core 服务的命令行工具：算法查询、预测、训练、任务管理与下载
//!
//! Usage:
//!   compredict-cli algorithms                         List algorithms
//!   compredict-cli predict <id> <features.json>       Run a prediction
//!   compredict-cli task <job_id>                      Show a task
//!   compredict-cli help                               Show all commands

use anyhow::{anyhow, bail, Context};
use compredict_client::{
    Client, ClientBuilder, ClientConfig, FitOptions, Outcome, PredictOptions, Resource, Task, TemplateKind,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = take_option(&mut args, "--config").map(PathBuf::from);

    if args.is_empty() {
        print_usage();
        std::process::exit(1);
    }

    let command = args.remove(0);
    let result = match command.as_str() {
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "algorithms" | "algorithm" | "versions" | "predict" | "fit" | "task" | "cancel" | "template"
        | "graph" => connect(config_path.as_deref()).and_then(|client| run(&client, &command, args)),
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"compredict-cli — COMPREDICT AI Core 命令行工具

USAGE:
    compredict-cli [--config <file>] <COMMAND> [OPTIONS]

COMMANDS:
    algorithms                                  List available algorithms
    algorithm <id>                              Show one algorithm
    versions <id>                               List the versions of an algorithm
    predict <id> <features> [--version V] [--no-evaluate] [--encrypt] [--callback-param JSON]
                                                Run a prediction (JSON file or raw upload)
    fit <id> <features> [--version V] [--export-new-version]
                                                Train an algorithm
    task <job_id>                               Show the state of a task
    cancel <job_id>                             Cancel a task
    template <id> [--type input|output] [--version V] [--out DIR]
                                                Download an input/output template
    graph <id> [--type input|output] [--version V] [--out DIR]
                                                Download a graph
    version                                     Show version information
    help                                        Show this help message

ENVIRONMENT:
    COMPREDICT_AI_CORE_KEY                      API token (or keyring compredict-ai-core/api-token)
    COMPREDICT_AI_CORE_BASE_URL                 Service root (default https://core.compredict.ai/api/)
    COMPREDICT_AI_CORE_PPK                      Private key for encrypted results
    COMPREDICT_AI_CORE_PASSPHRASE               Passphrase of the private key
    RUST_LOG                                    Log filter (default warn)"#
    );
}

fn cmd_version() {
    println!("compredict-cli {}", env!("CARGO_PKG_VERSION"));
}

fn connect(config_path: Option<&Path>) -> anyhow::Result<Client> {
    let config = match config_path {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    }
    .apply_env()?;
    // HTTP errors are reported with their status.
    Ok(ClientBuilder::from_config(config).fail_on_error(true).build()?)
}

fn run(client: &Client, command: &str, mut args: Vec<String>) -> anyhow::Result<()> {
    match command {
        "algorithms" => {
            let algorithms = expect(client, client.get_algorithms()?)?;
            for entry in algorithms.iter() {
                let algorithm = entry?;
                println!("{}\t{}", algorithm.id(), algorithm.name().unwrap_or(""));
            }
        }
        "algorithm" => {
            let id = positional(&args, 0, "algorithm id")?;
            let algorithm = expect(client, client.get_algorithm(id)?)?;
            println!("id:          {}", algorithm.id());
            println!("name:        {}", algorithm.name().unwrap_or(""));
            println!("description: {}", algorithm.description().unwrap_or(""));
            for version in algorithm.versions() {
                println!("version:     {}", version.version().unwrap_or("?"));
            }
        }
        "versions" => {
            let id = positional(&args, 0, "algorithm id")?;
            for version in expect(client, client.get_algorithm_versions(id)?)? {
                println!(
                    "{}\t{}",
                    version.version().unwrap_or("?"),
                    version.change_description().unwrap_or("")
                );
            }
        }
        "predict" => {
            let version = take_option(&mut args, "--version");
            let callback_param = take_option(&mut args, "--callback-param");
            let no_evaluate = take_flag(&mut args, "--no-evaluate");
            let encrypt = take_flag(&mut args, "--encrypt");
            let id = positional(&args, 0, "algorithm id")?;
            let features = positional(&args, 1, "features file")?;

            let mut options = PredictOptions::new().evaluate(!no_evaluate).encrypt(encrypt);
            if let Some(v) = version {
                options = options.version(v);
            }
            if let Some(raw) = callback_param {
                let param: Value = serde_json::from_str(&raw).context("--callback-param must be JSON")?;
                options = options.callback_param(param);
            }

            match expect(client, client.get_prediction(id, load_features(features)?, &options)?)? {
                Resource::Task(task) => print_task(&task),
                Resource::Prediction(p) => {
                    print_json("predictions", p.predictions());
                    print_json("evaluations", p.evaluations());
                    print_json("monitors", p.monitors());
                }
                other => bail!("unexpected {:?} resource", other.kind()),
            }
        }
        "fit" => {
            let version = take_option(&mut args, "--version");
            let export = take_flag(&mut args, "--export-new-version");
            let id = positional(&args, 0, "algorithm id")?;
            let features = positional(&args, 1, "features file")?;

            let mut options = FitOptions::new().export_new_version(export);
            if let Some(v) = version {
                options = options.version(v);
            }
            let task = expect(client, client.train_algorithm(id, load_features(features)?, &options)?)?;
            print_task(&task);
        }
        "task" => {
            let job_id = positional(&args, 0, "job id")?;
            print_task(&expect(client, client.get_task_result(job_id)?)?);
        }
        "cancel" => {
            let job_id = positional(&args, 0, "job id")?;
            let answer = expect(client, client.cancel_task(job_id)?)?;
            println!("canceled: {}", answer.is_canceled().unwrap_or(false));
            print_task(&answer);
        }
        "template" | "graph" => {
            let kind: TemplateKind = take_option(&mut args, "--type")
                .map(|t| t.parse::<TemplateKind>())
                .transpose()?
                .unwrap_or_default();
            let version = take_option(&mut args, "--version");
            let out = take_option(&mut args, "--out").unwrap_or_else(|| ".".to_string());
            let id = positional(&args, 0, "algorithm id")?;

            let outcome = if command == "template" {
                client.get_template(id, kind, version.as_deref())?
            } else {
                client.get_graph(id, kind, version.as_deref())?
            };
            let artifact = expect(client, outcome)?;
            let path = artifact.save_in(&out).with_context(|| format!("cannot write into {}", out))?;
            println!("{} ({} bytes)", path.display(), artifact.len());
        }
        other => bail!("unknown command {}", other),
    }
    Ok(())
}

/// Unwrap a call outcome, turning the non-resource shapes into errors.
fn expect<T>(client: &Client, outcome: Outcome<T>) -> anyhow::Result<T> {
    match outcome {
        Outcome::Resource(r) => Ok(r),
        Outcome::Text(text) => Err(anyhow!("service answered: {}", text)),
        Outcome::Failed => Err(anyhow!(
            "request failed: {}",
            client.last_error().map(|e| e.to_string()).unwrap_or_default()
        )),
    }
}

/// JSON files are sent as parsed feature data; anything else is uploaded as is.
fn load_features(path: &str) -> anyhow::Result<compredict_client::Features> {
    let path = PathBuf::from(path);
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        let raw = std::fs::read_to_string(&path).with_context(|| format!("cannot read {}", path.display()))?;
        let value: Value = serde_json::from_str(&raw).with_context(|| format!("{} is not JSON", path.display()))?;
        return Ok(value.into());
    }
    Ok(path.into())
}

fn print_task(task: &Task) {
    println!("job_id:   {}", task.job_id());
    println!("status:   {}", task.current_status());
    if let Some(success) = task.success() {
        println!("success:  {}", success);
    }
    if let Some(error) = task.error() {
        println!("error:    {}", error);
    }
    print_json("predictions", task.predictions());
    print_json("evaluations", task.evaluations());
    print_json("monitors", task.monitors());
}

fn print_json(label: &str, value: Option<&Value>) {
    if let Some(v) = value {
        let rendered = serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string());
        println!("{}: {}", label, rendered);
    }
}

fn positional<'a>(args: &'a [String], index: usize, what: &str) -> anyhow::Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing {}", what))
}

/// Remove `--name value` from `args` and return the value.
fn take_option(args: &mut Vec<String>, name: &str) -> Option<String> {
    let i = args.iter().position(|a| a == name)?;
    if i + 1 >= args.len() {
        args.remove(i);
        return None;
    }
    let value = args.remove(i + 1);
    args.remove(i);
    Some(value)
}

fn take_flag(args: &mut Vec<String>, name: &str) -> bool {
    match args.iter().position(|a| a == name) {
        Some(i) => {
            args.remove(i);
            true
        }
        None => false,
    }
}
