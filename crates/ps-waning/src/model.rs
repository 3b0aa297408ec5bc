//! Daily SIRSV stepping with per-individual immunity countdowns.

use std::io::Write;

use ps_core::{RunContext, Tolerances, nearly_equal};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Weibull};
use tracing::{debug, info, warn};

use crate::error::{WaningError, WaningResult};
use crate::params::{RevaccinationStrategy, WaningParams};

/// Matches the looseness of a float population check.
const CONSERVATION_TOL: Tolerances = Tolerances {
    abs: 1e-8,
    rel: 1e-5,
};

/// Counts of days on which a consistency check failed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WaningDiagnostics {
    pub rounds: usize,
    pub revaccinated: usize,
    pub conservation_violations: usize,
    pub negative_days: usize,
    /// Days where V differs from the number of tracked vaccinated countdowns.
    pub length_discrepancies: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WaningTrajectory {
    pub s: Vec<f64>,
    pub i: Vec<f64>,
    pub r: Vec<f64>,
    pub v: Vec<f64>,
    pub diagnostics: WaningDiagnostics,
}

impl WaningTrajectory {
    fn with_capacity(days: usize) -> Self {
        Self {
            s: Vec::with_capacity(days),
            i: Vec::with_capacity(days),
            r: Vec::with_capacity(days),
            v: Vec::with_capacity(days),
            diagnostics: WaningDiagnostics::default(),
        }
    }

    fn push(&mut self, (s, i, r, v): (f64, f64, f64, f64)) {
        self.s.push(s);
        self.i.push(i);
        self.r.push(r);
        self.v.push(v);
    }

    pub fn len(&self) -> usize {
        self.s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }

    pub fn total(&self, day: usize) -> f64 {
        self.s[day] + self.i[day] + self.r[day] + self.v[day]
    }

    /// Largest I and the day it occurred.
    pub fn peak_infected(&self) -> (f64, usize) {
        self.i
            .iter()
            .enumerate()
            .fold((f64::NEG_INFINITY, 0), |(best, day), (k, &value)| {
                if value > best { (value, k) } else { (best, day) }
            })
    }

    /// Write `day,S,I,R,V` rows.
    pub fn write_csv<W: Write>(&self, writer: W) -> WaningResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["day", "S", "I", "R", "V"])?;
        for day in 0..self.len() {
            csv.write_record([
                day.to_string(),
                self.s[day].to_string(),
                self.i[day].to_string(),
                self.r[day].to_string(),
                self.v[day].to_string(),
            ])?;
        }
        csv.flush()?;
        Ok(())
    }
}

/// Remaining immunity in whole days, one entry per individual.
#[derive(Debug)]
struct ImmunityPool {
    countdowns: Vec<u32>,
    distribution: Weibull<f64>,
}

impl ImmunityPool {
    fn new(shape: f64, scale: f64) -> WaningResult<Self> {
        let distribution = Weibull::new(scale, shape).map_err(|e| WaningError::Distribution {
            message: e.to_string(),
        })?;
        Ok(Self {
            countdowns: Vec::new(),
            distribution,
        })
    }

    fn len(&self) -> usize {
        self.countdowns.len()
    }

    fn sample(&self, rng: &mut StdRng) -> u32 {
        // Saturating cast; draws are never negative.
        self.distribution.sample(rng) as u32
    }

    fn enroll(&mut self, count: usize, rng: &mut StdRng) {
        self.countdowns.reserve(count);
        for _ in 0..count {
            let days = self.sample(rng);
            self.countdowns.push(days);
        }
    }

    /// Redraw `count` countdowns; returns how many were reset.
    fn revaccinate(
        &mut self,
        count: usize,
        strategy: RevaccinationStrategy,
        rng: &mut StdRng,
    ) -> usize {
        let count = count.min(self.countdowns.len());
        if count == 0 {
            return 0;
        }
        let chosen: Vec<usize> = match strategy {
            RevaccinationStrategy::Random => {
                rand::seq::index::sample(rng, self.countdowns.len(), count).into_vec()
            }
            RevaccinationStrategy::Targeted => {
                let mut order: Vec<usize> = (0..self.countdowns.len()).collect();
                order.sort_by_key(|&k| self.countdowns[k]);
                order.truncate(count);
                order
            }
        };
        for k in chosen {
            self.countdowns[k] = self.sample(rng);
        }
        count
    }

    /// Drop expired entries, count down the rest; returns the number waned.
    fn wane(&mut self) -> usize {
        let before = self.countdowns.len();
        self.countdowns.retain_mut(|days| {
            if *days > 0 {
                *days -= 1;
                true
            } else {
                false
            }
        });
        before - self.countdowns.len()
    }
}

/// Configured SIRSV run; each call to [`WaningModel::run`] reseeds the RNG.
#[derive(Clone, Debug)]
pub struct WaningModel {
    params: WaningParams,
    strategy: RevaccinationStrategy,
    seed: u64,
}

impl WaningModel {
    pub fn new(params: WaningParams) -> WaningResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            strategy: RevaccinationStrategy::default(),
            seed: 42,
        })
    }

    pub fn with_strategy(mut self, strategy: RevaccinationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn params(&self) -> &WaningParams {
        &self.params
    }

    pub fn strategy(&self) -> RevaccinationStrategy {
        self.strategy
    }

    fn is_round_start(&self, t: usize) -> bool {
        let p = &self.params;
        t >= p.start_vax_day && (t - p.start_vax_day) % p.vax_period == 0
    }

    fn is_vaccination_day(&self, t: usize) -> bool {
        let p = &self.params;
        t >= p.start_vax_day && (t - p.start_vax_day) % p.vax_period < p.vax_duration
    }

    pub fn run(&self, ctx: &mut RunContext) -> WaningResult<WaningTrajectory> {
        let span = ctx.span();
        let _guard = span.enter();
        let p = &self.params;
        let n = p.population();
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut vaccinated = ImmunityPool::new(p.weibull_shape_vax, p.weibull_scale_vax)?;
        let mut recovered = ImmunityPool::new(p.weibull_shape_rec, p.weibull_scale_rec)?;
        vaccinated.enroll(p.v0 as usize, &mut rng);
        recovered.enroll(p.r0 as usize, &mut rng);

        let mut out = WaningTrajectory::with_capacity(p.days);
        out.push((p.s0, p.i0, p.r0, p.v0));
        info!(
            strategy = %self.strategy,
            seed = self.seed,
            days = p.days,
            population = n,
            "starting waning simulation"
        );

        let mut daily_target = 0.0;
        for t in 1..p.days {
            let (s, i, r, v) = (out.s[t - 1], out.i[t - 1], out.r[t - 1], out.v[t - 1]);
            let new_seeds = p.seed_rate.min(s);

            if self.is_round_start(t) {
                out.diagnostics.rounds += 1;
                daily_target = (p.vax_rate * s).min(s);
                let to_reset = (p.vax_rate * p.vax_period as f64 * v).min(v) as usize;
                let reset = vaccinated.revaccinate(to_reset, self.strategy, &mut rng);
                out.diagnostics.revaccinated += reset;
                info!(
                    round = out.diagnostics.rounds,
                    day = t,
                    daily_target,
                    revaccinated = reset,
                    "vaccination round"
                );
            }

            let new_vaccinations = if self.is_vaccination_day(t) {
                daily_target.min(s).max(0.0) as usize
            } else {
                0
            };
            vaccinated.enroll(new_vaccinations, &mut rng);

            let new_infections = p.beta * s * i / n + new_seeds;
            let new_recoveries = p.gamma * i;
            recovered.enroll(new_recoveries as usize, &mut rng);

            let vax = new_vaccinations as f64;
            let mut next = (
                s - new_infections - vax,
                i + new_infections - new_recoveries,
                r + new_recoveries,
                v + vax,
            );

            let waned_vax = vaccinated.wane();
            let waned_rec = recovered.wane();
            next.0 += (waned_vax + waned_rec) as f64;
            next.3 -= waned_vax as f64;
            next.2 -= waned_rec as f64;
            debug!(
                day = t,
                new_infections,
                new_recoveries,
                new_vaccinations,
                waned_vax,
                waned_rec,
                "day"
            );

            let (s, i, r, v) = next;
            if vaccinated.len() as f64 != v {
                out.diagnostics.length_discrepancies += 1;
                warn!(day = t, tracked = vaccinated.len(), v, "vaccinated count discrepancy");
            }
            let total = s + i + r + v;
            if !nearly_equal(total, n, CONSERVATION_TOL) {
                out.diagnostics.conservation_violations += 1;
                warn!(day = t, total, expected = n, "population not conserved");
            }
            if s < 0.0 || i < 0.0 || r < 0.0 || v < 0.0 {
                out.diagnostics.negative_days += 1;
                warn!(day = t, s, i, r, v, "negative compartment values");
            }

            out.push(next);
            ctx.record_step(t as f64);
        }

        info!(
            rounds = out.diagnostics.rounds,
            elapsed_s = ctx.elapsed_s(),
            "waning simulation completed"
        );
        Ok(out)
    }
}
