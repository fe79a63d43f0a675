use woodfish_core::{FortuneRecord, MeritState};

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let merit = MeritState::open()?;
    match merit.last_fortune() {
        Some(fortune) if json => println!("{}", serde_json::to_string_pretty(fortune)?),
        Some(fortune) => print!("{}", render(fortune)),
        None => println!("no fortune drawn yet"),
    }
    Ok(())
}

/// Multi-line plain-text rendering of a fortune.
pub fn render(fortune: &FortuneRecord) -> String {
    let mut out = format!("第{}签  {}\n", fortune.id, fortune.luck);
    for line in &fortune.poem {
        out.push_str("    ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&fortune.explanation);
    out.push('\n');
    out
}
