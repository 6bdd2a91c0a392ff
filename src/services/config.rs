use crate::cli::Cli;
use crate::domain::RunConfig;

/// Resolve the parsed CLI into a run configuration.
///
/// The test flags parse as `Option<bool>`, so a flag the user named on the
/// command line is distinguishable from a defaulted one even when the
/// supplied value equals the default. `--skip-all` disables every probe as a
/// baseline; any test flag explicitly present is then re-applied with its
/// supplied value, overriding the skip for exactly the flags the user
/// mentioned.
pub fn resolve(cli: &Cli) -> RunConfig {
    let fallback = !cli.skip_all;
    RunConfig {
        vault_url: cli.vault_url.clone(),
        key_name: cli.key_name.clone(),
        algorithm: cli.algorithm,
        run_sign: cli.test_sign.unwrap_or(fallback),
        run_verify: cli.test_verify.unwrap_or(fallback),
        run_get: cli.test_get.unwrap_or(fallback),
    }
}
