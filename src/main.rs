use anyhow::Context;
use clap::Parser;

mod cli;
mod domain;
mod services;

use cli::Cli;
use services::auth::{CredentialChain, VAULT_RESOURCE};
use services::vault::VaultClient;
use services::{config, probes, report};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let run = config::resolve(&cli);

    if !run.any_probe() {
        return report::print_no_tests(cli.json);
    }

    let token = CredentialChain::from_env()
        .acquire(VAULT_RESOURCE)
        .context("failed to obtain credentials")?;
    let client = VaultClient::new(&run.vault_url, token)?;

    let mut reporter = report::Reporter::new(cli.json);
    reporter.begin(&run);
    let summary = probes::run(&run, &client, &mut |probe| reporter.probe(probe));
    reporter.finish(&summary)
}
