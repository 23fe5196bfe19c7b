use std::error::Error;
use std::path::Path;

use csv::ReaderBuilder;

use common::constants::N_AXES;

/// Loads a recording of tab separated frames, one frame per line.
///
/// Each frame is returned exactly as a serial device would write it, minus
/// the line terminator.
pub fn load_frames<P: AsRef<Path>>(file_path: P) -> Result<Vec<String>, Box<dyn Error>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_path(file_path)?;

    let mut frames = Vec::new();
    for result in rdr.records() {
        let record = result?;
        frames.push(record.iter().collect::<Vec<&str>>().join("\t"));
    }
    Ok(frames)
}

/// Loads a recording and parses every frame into its six axis values.
pub fn load_samples<P: AsRef<Path>>(file_path: P) -> Result<Vec<[i32; N_AXES]>, Box<dyn Error>> {
    load_frames(file_path)?
        .iter()
        .map(|frame| -> Result<[i32; N_AXES], Box<dyn Error>> {
            let values = frame
                .split('\t')
                .map(|field| field.trim().parse::<i32>())
                .collect::<Result<Vec<i32>, _>>()?;
            <[i32; N_AXES]>::try_from(values.as_slice())
                .map_err(|_| format!("expected {} fields in {:?}", N_AXES, frame).into())
        })
        .collect()
}
