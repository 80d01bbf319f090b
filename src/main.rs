use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use crashmap::api::ApiClient;
use crashmap::color::Legend;
use crashmap::config::Settings;
use crashmap::data::loader;
use crashmap::data::model::FeatureCollection;
use crashmap::data::summary::ControlHint;
use crashmap::error::Alert;
use crashmap::geo::ViewFit;
use crashmap::selector::{derive_layer, Derived, Request};
use crashmap::state::Session;

const USAGE: &str = "usage: crashmap [DATA_FILE] [--settings SETTINGS.json]";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{USAGE}");
        return Ok(());
    }

    let mut data_file = None;
    let mut settings = Settings::from_env();
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        if arg == "--settings" {
            let path = rest.next().context(USAGE)?;
            settings = Settings::from_json_file(Path::new(path))?;
        } else {
            data_file = Some(arg.clone());
        }
    }

    let (collection, load_alert) = match &data_file {
        Some(path) => (loader::load_file(Path::new(path))?, None),
        None => load_remote(&settings),
    };
    log::info!(
        "{} features, {} columns",
        collection.len(),
        collection.column_names.len()
    );

    let session = Session::new(&settings);
    let derived = derive_layer(&collection, &Request::redraw(), &session);
    let Derived::Drawn(drawn) = derived else {
        println!("{}", json!({ "features": 0, "alert": load_alert }));
        return Ok(());
    };

    let columns: Vec<_> = collection
        .column_names
        .iter()
        .map(|name| {
            let unique = collection.unique_values.get(name).map_or(0, |v| v.len());
            json!({
                "name": name,
                "unique": unique,
                "control": ControlHint::for_count(unique).name(),
                "legend": Legend::for_column(&drawn.filtered, name),
            })
        })
        .collect();

    let summary = json!({
        "features": collection.len(),
        "filtered": drawn.filtered.len(),
        "geometry": drawn.geometry_type.to_string(),
        "alert": drawn.alert.or(load_alert),
        "layer": drawn.layer,
        "columns": columns,
        "view": ViewFit::for_features(&drawn.filtered),
        "map_style": drawn.session.map_style().descriptor(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Fetch the default dataset. Failures are reported, not fatal.
fn load_remote(settings: &Settings) -> (FeatureCollection, Option<Alert>) {
    let fetched = ApiClient::new(settings).and_then(|client| client.fetch_default());
    match fetched {
        Ok(collection) => (collection, None),
        Err(e) => {
            log::error!("{e}");
            (FeatureCollection::default(), e.alert())
        }
    }
}
