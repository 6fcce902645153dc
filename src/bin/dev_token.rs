use std::env;

use anyhow::{anyhow, Result};

fn main() -> Result<()> {
    let principal = env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("Usage: dev_token <principal>"))?;

    println!("{}", delta_practice::issue_dev_token(&principal)?);
    Ok(())
}
