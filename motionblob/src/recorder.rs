//! Appends every sample to a log file.
//!
//! Each session starts with `START <unix time>`, then one line per sample:
//! `Accel(x,y,z): (ax, ay, az)  Gyro(x,y,z): (gx, gy, gz), Time: <unix time>`.
//! The replay source reads this format back.

use log::{info, warn};
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::task::JoinHandle;

use bridge_rs::models::shutdown::Shutdown;
use common::{Clock, ImuSample};
use publisher::Subscription;

pub fn format_sample(sample: &ImuSample) -> String {
    format!("{}, Time: {}", sample, sample.timestamp())
}

/// Writes samples taken from `samples` to `path` until shutdown.
pub fn spawn_recorder(
    path: PathBuf,
    mut samples: Subscription<ImuSample>,
    shutdown: Shutdown,
) -> JoinHandle<std::io::Result<usize>> {
    tokio::spawn(async move {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        let mut out = BufWriter::new(file);
        out.write_all(format!("START {}\n", Clock::now().as_secs()).as_bytes())
            .await?;
        out.flush().await?;
        info!("Recording samples to {}", path.display());

        let mut written = 0;
        loop {
            let sample = tokio::select! {
                _ = shutdown.wait() => break,
                sample = samples.next() => sample,
            };
            let Some(sample) = sample else {
                warn!("Sample source closed, recorder stopping");
                break;
            };
            out.write_all(format!("{}\n", format_sample(&sample)).as_bytes())
                .await?;
            out.flush().await?;
            written += 1;
        }

        out.flush().await?;
        info!("Recorded {} samples", written);
        Ok::<usize, std::io::Error>(written)
    })
}
