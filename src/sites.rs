use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::model::Site;

// Reads the sites file: one page per line, `route<delim>screen<delim>url`.
// Lines are trimmed before splitting. Missing fields load as empty strings
// and nothing is validated here; a bad url simply fails its audits later.
pub fn read_sites_file(path: &Path, delimiter: char) -> io::Result<Vec<Site>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut sites = Vec::new();
    for line in reader.lines() {
        let line = line?;
        sites.push(parse_line(line.trim(), delimiter));
    }
    Ok(sites)
}

fn parse_line(line: &str, delimiter: char) -> Site {
    let mut fields = line.split(delimiter);
    Site {
        route: fields.next().unwrap_or("").to_string(),
        screen: fields.next().unwrap_or("").to_string(),
        url: fields.next().unwrap_or("").to_string(),
    }
}
