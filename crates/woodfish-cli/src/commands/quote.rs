use woodfish_core::{AnyOracle, Config, Oracle};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let oracle = AnyOracle::from_config(&config);
    let rt = tokio::runtime::Runtime::new()?;
    let quote = rt.block_on(oracle.short_quote());
    println!("{quote}");
    Ok(())
}
