//! Parameter sweep over chain strength scales and annealing times

use crate::embedding::{embed_bqm, unembed_sampleset, ChainBreakMethod, Embedding};
use crate::qubo::{load_coo, BinaryQuadraticModel, Variable, Vartype};
use crate::sampler::{AnnealingSampler, AnswerMode, SampleSet, Sampler, StructuredMock};
use crate::sweep::{output_file_name, BatchCache, ExperimentConfig};
use crate::topology::Qubit;
use crate::Result;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// What a sweep did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepSummary {
    /// Parameter points processed
    pub points: usize,
    /// Batches obtained from the sampler
    pub batches_sampled: usize,
    /// Batches served from the cache
    pub batches_loaded: usize,
    /// Unembedded result files, in parameter order
    pub outputs: Vec<PathBuf>,
}

/// Sweep over a loaded problem and embedding
#[derive(Debug, Clone)]
pub struct ExperimentRunner {
    config: ExperimentConfig,
    bqm: BinaryQuadraticModel<Variable>,
    embedding: Embedding,
    max_energy: f64,
    cache: BatchCache,
    show_progress: bool,
}

impl ExperimentRunner {
    /// Load the embedding and problem named by `config`
    pub fn new(config: ExperimentConfig) -> Result<Self> {
        config.validate()?;

        let embedding = Embedding::from_file(&config.embedding_file)?;
        let bqm = load_coo(&config.input_file, Vartype::Binary)?;
        let (min_energy, max_energy) = bqm.energy_scale()?;
        debug!(
            "Loaded {} variables and {} interactions, energy scale [{}, {}]",
            bqm.num_variables(),
            bqm.num_interactions(),
            min_energy,
            max_energy
        );

        let cache = BatchCache::new(config.raw_dir());
        Ok(Self {
            config,
            bqm,
            embedding,
            max_energy,
            cache,
            show_progress: true,
        })
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn model(&self) -> &BinaryQuadraticModel<Variable> {
        &self.bqm
    }

    pub fn embedding(&self) -> &Embedding {
        &self.embedding
    }

    /// Chain strength used for a scale
    pub fn chain_strength(&self, css: f64) -> f64 {
        0.5 * css * self.max_energy
    }

    /// Create the output tree, tolerating one left by an earlier run
    pub fn prepare_output_tree(&self) -> Result<()> {
        if self.config.output_dir.exists() {
            warn!("Experiment directory already exists.");
        }
        std::fs::create_dir_all(self.config.raw_dir())?;
        std::fs::create_dir_all(self.config.results_dir())?;
        Ok(())
    }

    /// Run every parameter point against `sampler`
    pub fn run<S: Sampler + ?Sized>(&self, sampler: &mut S) -> Result<SweepSummary> {
        self.embedding.validate(&self.bqm, sampler.adjacency())?;
        self.prepare_output_tree()?;

        let points = self.config.parameter_points();
        let progress = self.progress_bar(points.len());
        let mut summary = SweepSummary::default();

        for (css, at) in points {
            progress.set_message(format!("css={} at={}", css, at));

            let embedded = embed_bqm(
                &self.bqm,
                &self.embedding,
                sampler.adjacency(),
                self.chain_strength(css),
            )?;

            let mut batches = Vec::with_capacity(self.config.num_batches);
            for batch in 0..self.config.num_batches {
                let set = self.sample_or_load(sampler, &embedded, css, at, batch, &mut summary)?;
                batches.push(set);
            }

            let total = SampleSet::concatenate(&batches)?;
            let unembedded = unembed_sampleset(
                &total,
                &self.embedding,
                &self.bqm,
                ChainBreakMethod::MajorityVote,
            )?;

            let path = self.config.results_dir().join(output_file_name(at, css));
            unembedded.write_csv(BufWriter::new(File::create(&path)?))?;
            info!("Wrote {} rows to {}", unembedded.len(), path.display());

            summary.points += 1;
            summary.outputs.push(path);
            progress.inc(1);
        }

        progress.finish_and_clear();
        info!(
            "Sweep finished: {} points, {} batches sampled, {} loaded from cache",
            summary.points, summary.batches_sampled, summary.batches_loaded
        );
        Ok(summary)
    }

    fn sample_or_load<S: Sampler + ?Sized>(
        &self,
        sampler: &mut S,
        embedded: &BinaryQuadraticModel<Qubit>,
        css: f64,
        at: u64,
        batch: usize,
        summary: &mut SweepSummary,
    ) -> Result<SampleSet<Qubit>> {
        let path = self.cache.path(batch, at, css);

        if let Some(set) = self.cache.load(&path)? {
            info!(
                "Skipping batch {} @ css={} and at={} because it is already computed.",
                batch, css, at
            );
            summary.batches_loaded += 1;
            return Ok(set);
        }

        debug!(
            "Sampling batch {} @ css={} and at={} with {} reads on {}",
            batch,
            css,
            at,
            self.config.batch_size,
            sampler.name()
        );
        let set = sampler.sample(embedded, at, self.config.batch_size, AnswerMode::Raw)?;
        self.cache.store(&path, &set)?;
        summary.batches_sampled += 1;
        Ok(set)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new(len as u64);
        let style = ProgressStyle::with_template("{msg}\n{bar:40.cyan/blue} {pos}/{len} ({eta})")
            .map(|style| style.progress_chars("##-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(style);
        progress
    }
}

/// Connect to the configured solver, optionally replacing it with a mock
pub fn connect_sampler(solver_name: &str, mock: bool) -> Result<Box<dyn Sampler>> {
    let sampler = AnnealingSampler::connect(solver_name)?;

    if mock {
        info!("Using a structured mock of {}; results are random", solver_name);
        Ok(Box::new(StructuredMock::from_sampler(&sampler)))
    } else {
        Ok(Box::new(sampler))
    }
}

/// Load inputs, connect the sampler and run the whole sweep
pub fn run_experiment(config: ExperimentConfig, mock: bool) -> Result<SweepSummary> {
    let runner = ExperimentRunner::new(config)?;
    let mut sampler = connect_sampler(&runner.config().solver_name, mock)?;
    runner.run(sampler.as_mut())
}
