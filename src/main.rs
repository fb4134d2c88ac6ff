//! Demo: drive the provider with a simulated receiver walking through a geofence
//!
//! Usage: gnss_provider [CONFIG_JSON] [GEOFENCES_JSON]
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::error::Error;
use std::thread;
use std::time::Duration;

use gnss_provider::core::EARTH_MEAN_RADIUS_M;
use gnss_provider::hardware::FeedError;
use gnss_provider::{
    Fix, GeofenceRegion, GeofenceSetFile, GpsProvider, ManualClock, MockDriver, PowerMode,
    ProviderConfig, TransitionMask,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CENTER_LAT: f64 = 45.0703;
const CENTER_LON: f64 = 7.6869;
const FIX_INTERVAL_MS: u64 = 1_000;

/// North-south walk (meters from the center): approach, linger, leave
fn walk() -> Vec<f64> {
    let mut offsets: Vec<f64> = (0..=12).map(|i| 600.0 - 50.0 * i as f64).collect();
    offsets.extend(std::iter::repeat(0.0).take(8));
    offsets.extend((1..=12).map(|i| 50.0 * i as f64));
    offsets
}

fn fix_at_offset(offset_m: f64, seq: u32) -> Fix {
    let lat = CENTER_LAT + (offset_m / EARTH_MEAN_RADIUS_M).to_degrees();
    Fix::new(lat, CENTER_LON, 240.0)
        .with_satellites(8, 5)
        .with_gps_time(2300, seq * FIX_INTERVAL_MS as u32)
}

fn default_geofences() -> Result<Vec<GeofenceRegion>, Box<dyn Error>> {
    Ok(vec![
        GeofenceRegion::circle("piazza", CENTER_LAT, CENTER_LON, 150.0)?.with_responsiveness_ms(5_000),
        GeofenceRegion::circle("district", CENTER_LAT, CENTER_LON, 450.0)?
            .with_transitions(TransitionMask::ENTER | TransitionMask::EXIT),
    ])
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => ProviderConfig::load_from_file(path)?,
        None => ProviderConfig::default(),
    };
    let geofences = match args.next() {
        Some(path) => GeofenceSetFile::load_from_file(path)?.geofences,
        None => default_geofences()?,
    };

    let driver = MockDriver::new(config.event_queue_capacity);
    let producer = driver.producer();
    let clock = ManualClock::new(0);
    let mut gps = GpsProvider::with_config(driver, config, clock.clone())?;

    info!(device = gps.device_info().unwrap_or("unknown"), "provider ready");

    gps.on_location_update(|fix| {
        println!(
            "fix   {:>10.6} {:>10.6}  alt {:>6.1} m  svs {}",
            fix.latitude,
            fix.longitude,
            fix.altitude,
            fix.satellite_count()
        );
    });
    gps.on_geofences_trigger(|event| {
        let kind = match event.bitmap {
            TransitionMask::ENTER => "ENTER",
            TransitionMask::EXIT => "EXIT",
            TransitionMask::DWELL => "DWELL",
            _ => "?",
        };
        println!(
            "fence {:<8} {:<5} at {:>7.1} m ({:?})",
            event.region.id, kind, event.distance_m, event.status
        );
    });

    gps.set_power_mode(PowerMode::Full);
    gps.reset()?;
    gps.config_geofences(geofences)?;
    gps.start()?;

    // Simulated receiver: one fix per tick, pushed from its own thread
    let receiver = thread::spawn(move || {
        for (seq, offset) in walk().into_iter().enumerate() {
            let fix = fix_at_offset(offset, seq as u32);
            loop {
                match producer.push_fix(fix.clone()) {
                    Ok(()) => break,
                    Err(FeedError::Full) => thread::sleep(Duration::from_millis(1)),
                    Err(FeedError::Closed) => return,
                }
            }
            thread::sleep(Duration::from_millis(5));
        }
    });

    loop {
        let finished = receiver.is_finished();
        let handled = match gps.process() {
            Ok(handled) => handled,
            Err(e) => {
                warn!(error = %e, code = e.code(), "process failed");
                0
            }
        };
        if finished && handled == 0 {
            break;
        }
        clock.advance(FIX_INTERVAL_MS);
        thread::sleep(Duration::from_millis(5));
    }

    if receiver.join().is_err() {
        warn!("receiver thread panicked");
    }

    gps.stop()?;
    if let Some(fix) = gps.last_location() {
        info!(latitude = fix.latitude, longitude = fix.longitude, "last known location");
    }
    Ok(())
}
