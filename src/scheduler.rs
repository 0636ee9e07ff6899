use crate::types::{PipelineError, Result};
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::future::Future;
use tokio::sync::watch;
use tracing::info;

/// Parse "HH:MM" slots into sorted trigger times. An empty schedule is a
/// configuration error.
pub fn parse_times(times: &[String]) -> Result<Vec<NaiveTime>> {
    if times.is_empty() {
        return Err(PipelineError::Config(
            "schedule needs at least one time".to_string(),
        ));
    }
    let mut parsed = Vec::with_capacity(times.len());
    for raw in times {
        let time = NaiveTime::parse_from_str(raw, "%H:%M")
            .map_err(|e| PipelineError::Config(format!("invalid schedule time {:?}: {}", raw, e)))?;
        parsed.push(time);
    }
    parsed.sort();
    Ok(parsed)
}

/// Earliest configured slot strictly after `now` (today or tomorrow in the
/// schedule's timezone), with up to `jitter_minutes` of random offset either
/// way. Jitter can land the trigger in the past; the caller treats that as
/// an immediate fire.
pub fn next_trigger<R: Rng>(
    now: DateTime<Utc>,
    times: &[NaiveTime],
    tz: Tz,
    jitter_minutes: i64,
    rng: &mut R,
) -> DateTime<Utc> {
    let today = now.with_timezone(&tz).date_naive();
    let mut candidates = Vec::with_capacity(times.len() * 2);
    for offset in 0..2 {
        let date = today + Duration::days(offset);
        for time in times {
            // A slot erased by a DST gap in the zone has no instant; skip it.
            let Some(slot) = tz.from_local_datetime(&date.and_time(*time)).earliest() else {
                continue;
            };
            let slot = slot.with_timezone(&Utc);
            if slot > now {
                candidates.push(slot);
            }
        }
    }
    // With a non-empty schedule, tomorrow's slots are all in the future.
    let base = candidates
        .into_iter()
        .min()
        .unwrap_or_else(|| now + Duration::days(1));

    if jitter_minutes > 0 {
        base + Duration::minutes(rng.gen_range(-jitter_minutes..=jitter_minutes))
    } else {
        base
    }
}

/// Fires the pipeline at jittered daily slots. Runs never overlap; a run
/// that outlasts its slot simply delays the next trigger computation.
pub struct Scheduler {
    times: Vec<NaiveTime>,
    tz: Tz,
    jitter_minutes: i64,
}

impl Scheduler {
    pub fn new(times: Vec<NaiveTime>, tz: Tz, jitter_minutes: i64) -> Result<Self> {
        if times.is_empty() {
            return Err(PipelineError::Config(
                "schedule needs at least one time".to_string(),
            ));
        }
        Ok(Self {
            times,
            tz,
            jitter_minutes,
        })
    }

    pub async fn run<F, Fut>(&self, mut run_pipeline: F, mut shutdown: watch::Receiver<bool>)
    where
        F: FnMut(u64) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut rng = StdRng::from_entropy();
        let mut run_count: u64 = 0;

        loop {
            if *shutdown.borrow() {
                info!("scheduler stopping after {} runs", run_count);
                return;
            }

            let trigger = next_trigger(
                Utc::now(),
                &self.times,
                self.tz,
                self.jitter_minutes,
                &mut rng,
            );
            let wait = (trigger - Utc::now()).to_std().unwrap_or_default();
            info!("next run at {} (in {:?})", trigger, wait);

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown.changed() => continue,
            }

            run_count += 1;
            run_pipeline(run_count).await;

            // Guard sleep so a fast run cannot re-match the same slot.
            tokio::select! {
                _ = tokio::time::sleep(std::time::Duration::from_secs(60)) => {}
                _ = shutdown.changed() => continue,
            }
        }
    }
}
