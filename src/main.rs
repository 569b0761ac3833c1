// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::Parser;
use kbcli::cli::action::{CommandContext, Factory};
use kbcli::cli::CliArgs;
use kbcli::domain::config::KbcliConfig;
use kbcli::shared::{ErrorStrategy, Result};
use tracing::Level;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let level = if args.global.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = KbcliConfig::load();
    let no_color = args.global.no_color
        || config.as_ref().map(|c| c.no_color).unwrap_or_default();
    if no_color {
        colored::control::set_override(false);
    }
    let errors = ErrorStrategy::new(!no_color);

    if let Err(err) = run(args, config, errors).await {
        let code = errors.report(&err, &mut std::io::stderr());
        std::process::exit(code);
    }
}

async fn run(
    args: CliArgs,
    config: Result<KbcliConfig>,
    errors: ErrorStrategy,
) -> anyhow::Result<()> {
    let config = config?;
    let global = args.global;
    // Command line flags win over the config file
    let factory = Factory::new(
        global.kubeconfig.or(config.kubeconfig),
        global.context.or(config.context),
        global.namespace.or(config.namespace),
    );
    let mut ctx = CommandContext::new(factory, errors, config.editor);
    args.command.execute(&mut ctx).await?;
    Ok(())
}
