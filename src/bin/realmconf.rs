use anyhow::{Context, Result};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;

use realmconf::collection::ConfigCollection;
use realmconf::export::{self, ExportEngine, LogProgress};
use realmconf::paths::ConfigPaths;
use realmconf::realm::{self, RealmFields};
use realmconf::settings::Settings;
use realmconf::validate;

const USAGE: &str = "\
Usage: realmconf [--settings FILE] COMMAND
Commands:
  check              cross-check configs, client and realm record
  export             write both configs, client portal and realm record
  set-ip ADDRESS     set the hosting address, then export
  set-build BUILD    set the client build everywhere, then export
  defaults           reset both configs to the templates, then export";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut settings_file = "conf/realmconf.yaml".to_string();
    let mut command = None;
    let mut value = None;

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "--h" | "-h" => {
                println!("{}", USAGE);
                return Ok(());
            }
            "--settings" => {
                if i + 1 < args.len() {
                    i += 1;
                    settings_file = args[i].clone();
                } else {
                    eprintln!("Error: --settings requires a FILE argument");
                    return Ok(());
                }
            }
            arg if command.is_none() => command = Some(arg.to_string()),
            arg => value = Some(arg.to_string()),
        }
        i += 1;
    }

    let Some(command) = command else {
        println!("{}", USAGE);
        return Ok(());
    };

    let settings = match Settings::from_file(&settings_file) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("[settings] {:#}; continuing with defaults", e);
            Settings::default()
        }
    };

    let paths = ConfigPaths::discover(&settings);

    let world_template = ConfigCollection::load(ConfigPaths::world_template());
    let bnet_template = ConfigCollection::load(ConfigPaths::bnet_template());
    if world_template.is_empty() {
        tracing::warn!("[config] world template is empty, error loading templates/worldserver.conf");
    }
    if bnet_template.is_empty() {
        tracing::warn!("[config] gateway template is empty, error loading templates/bnetserver.conf");
    }

    let mut world = paths
        .world_conf
        .as_ref()
        .map(ConfigCollection::load)
        .unwrap_or_default();
    let mut bnet = paths
        .bnet_conf
        .as_ref()
        .map(ConfigCollection::load)
        .unwrap_or_default();

    // Nothing deployed yet: start from the templates so check/export have
    // something to work with.
    if world.is_empty() {
        tracing::info!("[config] current world settings are empty, applying template defaults");
        export::apply_defaults(&mut world, &world_template);
    }
    if bnet.is_empty() {
        tracing::info!("[config] current gateway settings are empty, applying template defaults");
        export::apply_defaults(&mut bnet, &bnet_template);
    }

    let client_text = paths
        .client_conf
        .as_ref()
        .and_then(|p| std::fs::read_to_string(p).ok());

    let pool = if settings.database_available {
        Some(
            MySqlPoolOptions::new()
                .max_connections(5)
                .connect(&settings.database_url())
                .await
                .with_context(|| format!("Cannot connect to DB: {}", settings.sql_ip))?,
        )
    } else {
        None
    };

    match command.as_str() {
        "check" => {
            let realm_fields = fetch_realm_checked(pool.as_ref()).await?;
            let report = validate::validate(
                &mut world,
                &mut bnet,
                &world_template,
                &bnet_template,
                client_text.as_deref(),
                &realm_fields,
            );
            println!("{}", report.render());
        }
        "export" => {
            run_export(&settings, &world, &bnet, pool.as_ref()).await?;
        }
        "set-ip" => {
            let address = value.context("set-ip requires an ADDRESS argument")?;
            export::set_external_address(&mut bnet, &address)?;
            run_export(&settings, &world, &bnet, pool.as_ref()).await?;
        }
        "set-build" => {
            let build = value.context("set-build requires a BUILD argument")?;
            export::set_build(&mut world, &mut bnet, &build)?;
            run_export(&settings, &world, &bnet, pool.as_ref()).await?;
        }
        "defaults" => {
            export::apply_defaults(&mut world, &world_template);
            export::apply_defaults(&mut bnet, &bnet_template);
            run_export(&settings, &world, &bnet, pool.as_ref()).await?;
        }
        other => {
            eprintln!("Unknown command: {}\n{}", other, USAGE);
        }
    }

    Ok(())
}

async fn fetch_realm_checked(pool: Option<&MySqlPool>) -> Result<RealmFields> {
    let pool = pool.context(
        "the database server must be running to check for issues; \
         start it, set database_available in the settings, and try again",
    )?;
    realm::fetch_realm(pool)
        .await
        .context("Cannot read the realm record (legion_auth.realmlist id 1)")
}

async fn run_export(
    settings: &Settings,
    world: &ConfigCollection,
    bnet: &ConfigCollection,
    pool: Option<&MySqlPool>,
) -> Result<()> {
    let engine = ExportEngine::new();
    let report = engine
        .export_all(settings, world, bnet, pool, &LogProgress)
        .await?;
    for line in &report.log {
        println!("{}", line);
    }
    Ok(())
}
