pub mod display;
pub mod filter;
pub mod parse;
pub mod returns;
pub mod schema;
pub mod validate;

use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Read a JSON request document from a file (or stdin with "-")
pub fn read_request<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let reader = open_input(path)?;
    let request = serde_json::from_reader(reader)?;
    Ok(request)
}

/// Open a file, or buffer stdin when the path is "-"
pub fn open_input(path: &Path) -> anyhow::Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        let mut buffer = Vec::new();
        BufReader::new(io::stdin().lock()).read_to_end(&mut buffer)?;

        if buffer.is_empty() {
            anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
        }
        Ok(Box::new(io::Cursor::new(buffer)))
    } else {
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
