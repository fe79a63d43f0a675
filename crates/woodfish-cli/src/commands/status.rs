use woodfish_core::MeritState;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let merit = MeritState::open()?;
    let json = serde_json::to_string_pretty(&merit.snapshot())?;
    println!("{json}");
    Ok(())
}
