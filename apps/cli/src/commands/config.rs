use serde::Serialize;
use tradingagents_dataflows::defaults::{standard_order, standard_vendors};
use tradingagents_dataflows::{DataflowsConfig, Operation, VendorConfig};

pub fn show(config: &DataflowsConfig) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Route {
    method: &'static str,
    vendors: &'static [&'static str],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Routes {
    vendors: Vec<VendorConfig>,
    routes: Vec<Route>,
}

fn standard_routes(config: &DataflowsConfig) -> Routes {
    let vendors = standard_vendors()
        .into_iter()
        .map(|(name, priority, options)| {
            VendorConfig::resolve(name, priority, &options, &config.retry)
        })
        .collect();
    let routes = Operation::ALL
        .into_iter()
        .map(|operation| Route {
            method: operation.method_name(),
            vendors: standard_order(operation),
        })
        .collect();
    Routes { vendors, routes }
}

pub fn routes(config: &DataflowsConfig) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&standard_routes(config))?);
    Ok(())
}
