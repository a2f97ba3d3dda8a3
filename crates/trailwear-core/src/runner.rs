//! Simulation driver loop with consumer pacing.
//!
//! This module provides [`run_simulation`], the top-level async function
//! that repeatedly:
//!
//! - **Selects** an endpoint pair by weighted random choice
//! - **Searches** for the least-cost route, streaming visited pixels in
//!   growing batches and yielding to the scheduler between them
//! - **Emits** the route and applies reinforcement
//! - **Awaits** the consumer's `advance` before the next iteration
//!
//! A minimum delay separates iterations, and a failed search or an
//! impossible selection backs off for the configured no-path delay.
//! Stop requests are honoured between iterations; a search in progress
//! always runs to completion.

use std::sync::Arc;

use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};
use trailwear_terrain::{PathResult, SearchOutcome};
use trailwear_types::{DriverPhase, EngineEvent, RouteFound};

use crate::channel::{EventSink, ProgressBatcher};
use crate::config::{DriverConfig, SearchConfig};
use crate::control::ControlState;
use crate::engine::{Engine, EngineError};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The engine rejected a search request.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: EngineError,
    },
}

/// Why the driver loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The configured iteration limit was reached.
    MaxIterationsReached,
    /// A stop signal was received.
    Stopped,
}

/// Counters describing a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationResult {
    /// The reason the loop ended.
    pub end_reason: EndReason,
    /// Iterations executed, including no-op ones.
    pub iterations: u64,
    /// Searches that reached their destination.
    pub routes_found: u64,
    /// Searches that exhausted their frontier.
    pub no_path: u64,
}

/// Pacing knobs for [`run_simulation`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunnerConfig {
    /// Progress batch sizing and yield cadence.
    pub search: SearchConfig,
    /// Iteration delays and bounds.
    pub driver: DriverConfig,
}

/// Run the driver loop until stopped or the iteration limit is reached.
///
/// Emits [`EngineEvent::Ready`] first, then waits for a start signal
/// unless the control state was created with auto start.
///
/// # Errors
///
/// Returns [`RunnerError`] if the engine rejects a selected pair, which
/// indicates corrupted settlement state.
#[allow(clippy::too_many_lines)]
pub async fn run_simulation(
    engine: &mut Engine,
    config: &RunnerConfig,
    control: &Arc<ControlState>,
    sink: &mut dyn EventSink,
) -> Result<SimulationResult, RunnerError> {
    let driver = &config.driver;
    let min_delay = Duration::from_millis(driver.min_iteration_delay_ms);
    let no_path_delay = Duration::from_millis(driver.no_path_delay_ms);

    let mut result = SimulationResult {
        end_reason: EndReason::Stopped,
        iterations: 0,
        routes_found: 0,
        no_path: 0,
    };
    let mut search_seq: u64 = 0;
    let mut awaiting_consumer = false;

    control.set_phase(DriverPhase::Idle);
    sink.emit(EngineEvent::Ready {
        settlements: engine.settlements().to_vec(),
    });

    if !control.is_started() {
        info!("Waiting for start signal");
        control.wait_for_start().await;
    }

    info!(
        settlements = engine.settlements().len(),
        max_iterations = driver.max_iterations,
        min_iteration_delay_ms = driver.min_iteration_delay_ms,
        "Simulation starting"
    );

    loop {
        // --- Check stop and bounds ---
        if control.is_stop_requested() {
            info!("Stop requested");
            result.end_reason = EndReason::Stopped;
            break;
        }
        if driver.max_iterations > 0 && result.iterations >= driver.max_iterations {
            info!(iterations = result.iterations, "Iteration limit reached");
            result.end_reason = EndReason::MaxIterationsReached;
            break;
        }

        // --- Await consumer (skipped on the first iteration) ---
        if awaiting_consumer && driver.await_consumer {
            control.set_phase(DriverPhase::AwaitingConsumer);
            control.wait_for_advance().await;
            if control.is_stop_requested() {
                info!("Stop requested while awaiting consumer");
                result.end_reason = EndReason::Stopped;
                break;
            }
        }
        awaiting_consumer = false;

        // --- Apply a pending usage reset ---
        if control.take_reset() {
            engine.reset_usage();
            info!("Usage reset, re-announcing settlements");
            sink.emit(EngineEvent::Ready {
                settlements: engine.settlements().to_vec(),
            });
        }

        let iteration_start = Instant::now();
        result.iterations = result.iterations.saturating_add(1);

        // --- Select ---
        control.set_phase(DriverPhase::Selecting);
        let Some((start, end)) = engine.select_pair() else {
            warn!(
                settlements = engine.settlements().len(),
                "No selectable settlement pair"
            );
            sink.emit(EngineEvent::diagnostic(
                "Cannot select a route: need at least two reachable settlements",
            ));
            tokio::time::sleep(no_path_delay.max(min_delay)).await;
            continue;
        };

        // --- Search ---
        search_seq = search_seq.saturating_add(1);
        control.set_phase(DriverPhase::Searching);
        let outcome = run_search(engine, start, end, search_seq, &config.search, sink).await?;

        match outcome {
            SearchOutcome::Found(path) => {
                control.set_phase(DriverPhase::Emitting);
                let usage = engine.reinforce(&path.path);
                if let Some(event) = route_event(engine, search_seq, (start, end), &path, usage) {
                    info!(
                        search = search_seq,
                        start = %event.start.name,
                        end = %event.end.name,
                        pixels = event.path.len(),
                        efficiency = event.efficiency,
                        "Route found"
                    );
                    sink.emit(EngineEvent::PathFound(event));
                }
                result.routes_found = result.routes_found.saturating_add(1);
                awaiting_consumer = true;
            }
            SearchOutcome::NoPathFound => {
                result.no_path = result.no_path.saturating_add(1);
                let (from, to) = (engine.settlement(start), engine.settlement(end));
                if let (Some(from), Some(to)) = (from, to) {
                    warn!(search = search_seq, start = %from.name, end = %to.name, "No path found");
                    sink.emit(EngineEvent::diagnostic(format!(
                        "No path from {} to {}",
                        from.name, to.name
                    )));
                    sink.emit(EngineEvent::NoPathFound {
                        search: search_seq,
                        start: from.clone(),
                        end: to.clone(),
                    });
                }
                tokio::time::sleep(no_path_delay).await;
            }
        }

        // --- Enforce minimum iteration spacing ---
        let elapsed = iteration_start.elapsed();
        if elapsed < min_delay {
            tokio::time::sleep(min_delay.saturating_sub(elapsed)).await;
        }
    }

    control.set_phase(DriverPhase::Stopped);
    Ok(result)
}

/// Drive one search to completion, emitting progress batches.
async fn run_search(
    engine: &Engine,
    start: usize,
    end: usize,
    search_seq: u64,
    config: &SearchConfig,
    sink: &mut dyn EventSink,
) -> Result<SearchOutcome, RunnerError> {
    if let (Some(from), Some(to)) = (engine.settlement(start), engine.settlement(end)) {
        sink.emit(EngineEvent::SearchStarted {
            search: search_seq,
            start: from.name.clone(),
            end: to.name.clone(),
        });
    }

    let mut search = engine.begin_search(start, end)?;
    let mut batcher = ProgressBatcher::new(config);
    let mut batches_since_yield: u32 = 0;

    loop {
        let finished = search.step(batcher.current());
        let visited = search.drain_visited();
        if !visited.is_empty() {
            sink.emit(EngineEvent::SearchProgress {
                search: search_seq,
                visited,
            });
            batcher.advance();
            batches_since_yield = batches_since_yield.saturating_add(1);
        }
        if finished {
            break;
        }
        if batches_since_yield >= config.yield_interval {
            batches_since_yield = 0;
            tokio::task::yield_now().await;
        }
    }

    debug!(search = search_seq, expanded = search.expanded(), "Search finished");
    Ok(search.finish())
}

fn route_event(
    engine: &Engine,
    search_seq: u64,
    (start, end): (usize, usize),
    result: &PathResult,
    usage: Vec<u16>,
) -> Option<RouteFound> {
    let path = result
        .path
        .iter()
        .map(|&i| u32::try_from(i).ok())
        .collect::<Option<Vec<u32>>>()?;
    Some(RouteFound {
        search: search_seq,
        path,
        start: engine.settlement(start)?.clone(),
        end: engine.settlement(end)?.clone(),
        efficiency: result.efficiency,
        usage,
    })
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        iterations = result.iterations,
        routes_found = result.routes_found,
        no_path = result.no_path,
        "Simulation ended"
    );
    if result.routes_found == 0 {
        warn!("Simulation ended without finding any route");
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing
)]
mod tests {
    use trailwear_terrain::{CostParams, ElevationField, Grid, IMPASSABLE};
    use trailwear_types::{ControlSignal, Settlement};

    use super::*;
    use crate::channel::ChannelSink;

    fn towns() -> Vec<Settlement> {
        vec![
            Settlement::new("Ashford", 1000.0, 1, 1),
            Settlement::new("Brookmere", 600.0, 14, 12),
            Settlement::new("Coldwater", 300.0, 13, 2),
        ]
    }

    fn make_engine(settlements: Vec<Settlement>) -> Engine {
        let grid = Grid::new(16, 16).unwrap();
        Engine::new(
            ElevationField::flat(grid, 80.0),
            settlements,
            CostParams::default(),
            3.0,
            11,
        )
        .unwrap()
    }

    fn config(max_iterations: u64, await_consumer: bool) -> RunnerConfig {
        RunnerConfig {
            search: SearchConfig {
                initial_batch: 4,
                batch_growth: 2.0,
                max_batch: 64,
                yield_interval: 1,
            },
            driver: DriverConfig {
                min_iteration_delay_ms: 0,
                no_path_delay_ms: 0,
                max_iterations,
                auto_start: true,
                await_consumer,
            },
        }
    }

    fn count(events: &[EngineEvent], kind: &str) -> usize {
        events.iter().filter(|e| e.kind() == kind).count()
    }

    #[tokio::test]
    async fn bounded_by_max_iterations() {
        let mut engine = make_engine(towns());
        let control = Arc::new(ControlState::new(true));
        let mut events: Vec<EngineEvent> = Vec::new();

        let result = run_simulation(&mut engine, &config(5, false), &control, &mut events)
            .await
            .unwrap();

        assert_eq!(result.end_reason, EndReason::MaxIterationsReached);
        assert_eq!(result.iterations, 5);
        assert_eq!(result.routes_found, 5);
        assert_eq!(control.phase(), DriverPhase::Stopped);

        assert_eq!(events.first().map(EngineEvent::kind), Some("ready"));
        assert_eq!(count(&events, "searchStarted"), 5);
        assert_eq!(count(&events, "pathFound"), 5);
        assert!(count(&events, "searchProgress") >= 5);
        assert!(engine.terrain().usage().peak() >= 1);
    }

    #[tokio::test]
    async fn route_events_are_well_formed() {
        let mut engine = make_engine(towns());
        let control = Arc::new(ControlState::new(true));
        let mut events: Vec<EngineEvent> = Vec::new();
        let _ = run_simulation(&mut engine, &config(8, false), &control, &mut events)
            .await
            .unwrap();

        let grid = *engine.terrain().grid();
        for event in &events {
            let EngineEvent::PathFound(route) = event else {
                continue;
            };
            let first = route.path.first().copied().unwrap() as usize;
            let last = route.path.last().copied().unwrap() as usize;
            assert_eq!(Some(first), grid.index(route.start.x, route.start.y));
            assert_eq!(Some(last), grid.index(route.end.x, route.end.y));
            assert_ne!(route.start.name, route.end.name);
            assert_eq!(route.usage.len(), route.path.len());
            assert!(route.usage.iter().all(|&u| u >= 1));
            for pair in route.path.windows(2) {
                assert!(grid.are_adjacent(pair[0] as usize, pair[1] as usize));
            }
        }
    }

    #[tokio::test]
    async fn progress_batches_cover_each_search() {
        let mut engine = make_engine(towns());
        let control = Arc::new(ControlState::new(true));
        let mut events: Vec<EngineEvent> = Vec::new();
        let _ = run_simulation(&mut engine, &config(1, false), &control, &mut events)
            .await
            .unwrap();

        let sizes: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::SearchProgress { visited, .. } => Some(visited.len()),
                _ => None,
            })
            .collect();
        assert!(!sizes.is_empty());
        assert!(sizes.iter().all(|&n| n <= 64));
        // The first batch is the smallest allowed.
        assert!(sizes.first().copied().unwrap() <= 4);
    }

    #[tokio::test]
    async fn stop_before_start() {
        let mut engine = make_engine(towns());
        let control = Arc::new(ControlState::new(false));
        control.request_stop();
        let mut events: Vec<EngineEvent> = Vec::new();

        let result = run_simulation(&mut engine, &config(0, true), &control, &mut events)
            .await
            .unwrap();

        assert_eq!(result.end_reason, EndReason::Stopped);
        assert_eq!(result.iterations, 0);
        assert_eq!(events.len(), 1);
        assert_eq!(count(&events, "ready"), 1);
    }

    #[tokio::test]
    async fn single_settlement_is_a_no_op_iteration() {
        let mut engine = make_engine(vec![Settlement::new("Solo", 10.0, 3, 3)]);
        let control = Arc::new(ControlState::new(true));
        let mut events: Vec<EngineEvent> = Vec::new();

        let result = run_simulation(&mut engine, &config(3, true), &control, &mut events)
            .await
            .unwrap();

        assert_eq!(result.iterations, 3);
        assert_eq!(result.routes_found, 0);
        assert_eq!(count(&events, "diagnostic"), 3);
        assert_eq!(count(&events, "searchStarted"), 0);
    }

    #[tokio::test]
    async fn walled_town_reports_no_path() {
        // "Keep" sits in the corner behind an impassable fence.
        let grid = Grid::new(8, 8).unwrap();
        let mut values = vec![40.0_f32; 64];
        for (x, y) in [(6_usize, 6_usize), (7, 6), (6, 7)] {
            values[y * 8 + x] = IMPASSABLE;
        }
        let elevation = ElevationField::from_values(grid, values).unwrap();
        let towns = vec![
            Settlement::new("Village", 100.0, 0, 0),
            Settlement::new("Keep", 100.0, 7, 7),
        ];
        let mut engine = Engine::new(elevation, towns, CostParams::default(), 1.0, 5).unwrap();
        let control = Arc::new(ControlState::new(true));
        let mut events: Vec<EngineEvent> = Vec::new();

        let result = run_simulation(&mut engine, &config(4, true), &control, &mut events)
            .await
            .unwrap();

        assert_eq!(result.iterations, 4);
        assert_eq!(result.no_path, 4);
        assert_eq!(result.routes_found, 0);
        assert_eq!(count(&events, "noPathFound"), 4);
        assert_eq!(engine.terrain().usage().worn_count(), 0);
    }

    #[tokio::test]
    async fn reset_clears_wear_before_next_iteration() {
        let mut engine = make_engine(towns());
        let control = Arc::new(ControlState::new(true));
        let mut events: Vec<EngineEvent> = Vec::new();
        let _ = run_simulation(&mut engine, &config(6, false), &control, &mut events)
            .await
            .unwrap();
        assert!(engine.terrain().usage().peak() >= 2);

        control.apply(ControlSignal::Reset);
        let mut events: Vec<EngineEvent> = Vec::new();
        let result = run_simulation(&mut engine, &config(1, false), &control, &mut events)
            .await
            .unwrap();

        assert_eq!(result.routes_found, 1);
        assert_eq!(count(&events, "ready"), 2);
        let route = events
            .iter()
            .find_map(|e| match e {
                EngineEvent::PathFound(route) => Some(route),
                _ => None,
            })
            .unwrap();
        let usage = engine.terrain().usage();
        assert_eq!(usage.peak(), 1);
        assert_eq!(usage.worn_count(), route.path.len());
        assert!(!control.take_reset());
    }

    #[tokio::test(start_paused = true)]
    async fn minimum_delay_is_enforced() {
        let mut engine = make_engine(towns());
        let control = Arc::new(ControlState::new(true));
        let mut cfg = config(3, false);
        cfg.driver.min_iteration_delay_ms = 100;
        let mut events: Vec<EngineEvent> = Vec::new();

        let began = Instant::now();
        let _ = run_simulation(&mut engine, &cfg, &control, &mut events)
            .await
            .unwrap();
        assert!(began.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_consumer_between_routes() {
        let control = Arc::new(ControlState::new(true));
        let (mut sink, mut rx) = ChannelSink::new();
        let handle = {
            let control = Arc::clone(&control);
            tokio::spawn(async move {
                let mut engine = make_engine(towns());
                run_simulation(&mut engine, &config(0, true), &control, &mut sink).await
            })
        };

        // The first route needs no advance.
        let mut routes = 0;
        while routes < 1 {
            if let Some(EngineEvent::PathFound(_)) = rx.recv().await {
                routes += 1;
            }
        }

        // Without an advance, no second search starts.
        let idle = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(EngineEvent::SearchStarted { .. }) = rx.recv().await {
                    return;
                }
            }
        })
        .await;
        assert!(idle.is_err());
        assert_eq!(control.phase(), DriverPhase::AwaitingConsumer);

        control.advance();
        while routes < 2 {
            if let Some(EngineEvent::PathFound(_)) = rx.recv().await {
                routes += 1;
            }
        }

        control.request_stop();
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.end_reason, EndReason::Stopped);
        assert_eq!(result.routes_found, 2);
    }
}
