// src/investigation/searcher.rs

//! Implements [`SearchManager`], the investigation state machine.
//!
//! An investigation passes through the [`InvestigationStage`s]:
//!
//! 1. `Init`: build the [`InvestigationPlan`] for the effect line
//! 2. `PerLogTypeScan`: scan every file of every step for cause clues, one
//!    thread per file
//! 3. `Verify`: check each selected rule's clues with the [`Verifier`]
//! 4. `Done`
//!
//! Scan threads share the read-only matchers and steps and own their file
//! handle and clue buffer. Buffers are sent back over a channel and merged,
//! in task order, only after the task completed. A task still running when
//! the timeout elapses is told to stop and is not waited for; its partial
//! clues are discarded.
//!
//! [`InvestigationStage`s]: self::InvestigationStage
//! [`Verifier`]: crate::rules::verifier::Verifier

use crate::common::{Count, FileOffset, LineSource};
use crate::data::clue::{CluesByPattern, EffectObservation};
use crate::data::datetime::leading_datetime;
#[allow(unused_imports)]
use crate::debug::printers::{de_err, de_wrn};
use crate::error::{Error, Result};
use crate::investigation::config::InvestigationConfig;
use crate::investigation::plan::{InvestigationPlan, InvestigationStep};
use crate::investigation::result::{InvestigationOutcome, InvestigationResult, SummaryInvestigation};
use crate::investigation::rulebase::RuleBase;
use crate::readers::helpers::fpath_to_path;
use crate::readers::linereader::LineReader;
use crate::readers::timewindow::TimeWindowLocator;
use crate::rules::verifier::Verifier;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use ::crossbeam_channel::{RecvTimeoutError, Receiver, Sender};
#[allow(unused_imports)]
use ::si_trace_print::{def1n, def1o, def1x, defn, defo, defx, defñ};

/// Stages of an investigation, in order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InvestigationStage {
    Init,
    PerLogTypeScan,
    Verify,
    Done,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// scan tasks
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Index of a scan task; the order results are merged in.
pub type TaskIndex = usize;

/// Where the backward scan of a file begins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScanEnd {
    /// The file holds the effect line, which starts at this offset.
    EffectLine(FileOffset),
    /// After the last line at or before the effect time.
    EffectTime,
}

/// One file of one [`InvestigationStep`].
#[derive(Debug)]
pub struct ScanTask {
    pub task_index: TaskIndex,
    pub step: Arc<InvestigationStep>,
    pub source: LineSource,
    pub end: ScanEnd,
}

/// What a completed scan task found.
#[derive(Debug, Default)]
pub struct ScanOutput {
    pub clues: CluesByPattern,
    /// conversion errors
    pub errors: Vec<Error>,
    pub lines_read: Count,
}

/// Sent from a scan thread to the fan-in.
type ChanDatum = (TaskIndex, Result<ScanOutput>);

/// Scan the file of `task` backward, from the end offset down to the first
/// line at or after the step's earliest cause time. A file with no leading
/// datetimes is scanned whole, up to the effect line if it holds it.
///
/// Checks `cancel` before each line; if set the task ends with
/// [`Error::Cancelled`].
pub fn scan_file(
    task: &ScanTask,
    config: &InvestigationConfig,
    cancel: &AtomicBool,
) -> Result<ScanOutput> {
    def1n!("({}, {:?})", task.task_index, task.source);
    let step: &InvestigationStep = &task.step;
    let mut linereader = LineReader::new(task.source.path.clone(), config.blocksz, config.lru_cache_sz)?;
    let filesz = linereader.filesz();

    let (stop_offset, end_offset) = {
        let mut locator = TimeWindowLocator::new(&mut linereader)?;
        // lines without a leading datetime cannot be located by time
        let dated: bool = locator.is_dated()?;
        if !dated {
            de_wrn!("no line of {:?} starts with a datetime; scanning all of it", task.source.path);
        }
        let stop_offset: FileOffset = match dated && step.is_bounded() {
            true => locator.search_left(step.earliest_cause_time())?,
            false => 0,
        };
        let end_offset: FileOffset = match (task.end, step.effect_time()) {
            (ScanEnd::EffectLine(offset), _) => std::cmp::min(offset, filesz),
            (ScanEnd::EffectTime, Some(effect_time)) if dated => locator.search_upper_bound(effect_time)?,
            (ScanEnd::EffectTime, _) => filesz,
        };
        (stop_offset, end_offset)
    };
    def1o!("scan [{}, {}) of filesz {}", stop_offset, end_offset, filesz);

    let matcher = step.matcher();
    let mut output = ScanOutput::default();
    for result in linereader.reverse_lines(end_offset, stop_offset) {
        if cancel.load(Ordering::Relaxed) {
            def1x!("cancelled");
            return Err(Error::Cancelled(task.source.path.clone()));
        }
        let (line, line_offset) = result?;
        output.lines_read += 1;
        if let Some(dt) = leading_datetime(&line) {
            if !step.is_line_in_time_range(&dt) {
                continue;
            }
        }
        let (clues, errors) = matcher.get_clues(&line, line_offset, &task.source);
        for (name, clue) in clues.into_iter() {
            output
                .clues
                .entry(name)
                .or_default()
                .push(clue);
        }
        output.errors.extend(errors);
    }
    def1x!("read {} lines, clues for {} patterns", output.lines_read, output.clues.len());

    Ok(output)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SearchManager
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Runs one investigation over a [`RuleBase`].
pub struct SearchManager {
    rulebase: Arc<RuleBase>,
    config: InvestigationConfig,
    /// Set to stop the scan threads.
    cancel: Arc<AtomicBool>,
    stage: InvestigationStage,
    errors: Vec<Error>,
    summary: SummaryInvestigation,
}

impl SearchManager {
    pub fn new(
        rulebase: Arc<RuleBase>,
        config: InvestigationConfig,
    ) -> SearchManager {
        SearchManager {
            rulebase,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
            stage: InvestigationStage::Init,
            errors: Vec::new(),
            summary: SummaryInvestigation::default(),
        }
    }

    /// Use the caller's cancellation flag; setting it stops the scan.
    pub fn with_cancel_flag(
        mut self,
        cancel: Arc<AtomicBool>,
    ) -> SearchManager {
        self.cancel = cancel;
        self
    }

    #[inline(always)]
    pub const fn stage(&self) -> InvestigationStage {
        self.stage
    }

    fn assert_stage(
        &self,
        stage_expect: InvestigationStage,
    ) {
        debug_assert_eq!(
            self.stage, stage_expect,
            "Unexpected InvestigationStage {:?}, expected {:?}",
            self.stage, stage_expect,
        );
    }

    /// Investigate `effect`: find the cause combinations satisfying the
    /// rules whose effect pattern matches the effect line.
    ///
    /// Always completes; scan and rule failures are in
    /// [`InvestigationOutcome::errors`].
    pub fn investigate(
        mut self,
        effect: &EffectObservation,
    ) -> InvestigationOutcome {
        defn!("({:?})", effect);
        let plan: InvestigationPlan = self.process_stage1_init(effect);
        let clues: CluesByPattern = self.process_stage2_scan(&plan);
        let results: Vec<InvestigationResult> = self.process_stage3_verify(&plan, &clues);
        self.process_stage4_done();

        self.summary.results = results.len() as Count;
        self.summary.errors = self.errors.len() as Count;
        defx!("{} results, {} errors", results.len(), self.errors.len());

        InvestigationOutcome {
            results,
            errors: self.errors,
            summary: self.summary,
        }
    }

    fn process_stage1_init(
        &mut self,
        effect: &EffectObservation,
    ) -> InvestigationPlan {
        self.assert_stage(InvestigationStage::Init);
        let (plan, errors) = InvestigationPlan::new(&self.rulebase, effect, &self.config);
        self.errors.extend(errors);
        self.summary.rules_selected = plan.rules().len() as Count;
        self.summary.steps = plan.steps().len() as Count;
        defñ!("effect log type {:?}, {} rules, {} steps", plan.effect_log_type(), plan.rules().len(), plan.steps().len());

        plan
    }

    /// Build one [`ScanTask`] per file of each step.
    fn scan_tasks(
        &mut self,
        plan: &InvestigationPlan,
    ) -> Vec<ScanTask> {
        let effect: &EffectObservation = plan.effect();
        let mut tasks: Vec<ScanTask> = Vec::new();
        for step in plan.steps().iter() {
            let log_type = match self.rulebase.log_type(step.log_type()) {
                Some(val) => val,
                None => {
                    defo!("log type {:?} has no file locators", step.log_type());
                    continue;
                }
            };
            let (sources, errors) = log_type.sources(&self.config);
            self.errors.extend(errors);
            for source in sources.into_iter() {
                let is_effect_file: bool = self.config.same_host(&source.host, &effect.source.host)
                    && fpath_to_path(&source.path) == fpath_to_path(&effect.source.path);
                let end = match is_effect_file {
                    true => ScanEnd::EffectLine(effect.byte_offset),
                    false => ScanEnd::EffectTime,
                };
                tasks.push(ScanTask {
                    task_index: tasks.len(),
                    step: step.clone(),
                    source,
                    end,
                });
            }
        }

        tasks
    }

    fn process_stage2_scan(
        &mut self,
        plan: &InvestigationPlan,
    ) -> CluesByPattern {
        self.assert_stage(InvestigationStage::Init);
        self.stage = InvestigationStage::PerLogTypeScan;

        let tasks: Vec<ScanTask> = self.scan_tasks(plan);
        defn!("{} scan tasks", tasks.len());
        let paths: Vec<LineSource> = tasks
            .iter()
            .map(|t| t.source.clone())
            .collect();
        let mut outputs: Vec<Option<Result<ScanOutput>>> = (0..tasks.len()).map(|_| None).collect();

        let (tx, rx): (Sender<ChanDatum>, Receiver<ChanDatum>) = ::crossbeam_channel::unbounded();
        let mut handles: Vec<(TaskIndex, thread::JoinHandle<()>)> = Vec::with_capacity(tasks.len());
        let mut running: usize = 0;
        for task in tasks.into_iter() {
            let task_index = task.task_index;
            let tx_ = tx.clone();
            let config_ = self.config.clone();
            let cancel_ = self.cancel.clone();
            let thread_name = format!("{}{}", self.config.thread_name_prefix, task_index);
            let result = thread::Builder::new()
                .name(thread_name)
                .spawn(move || {
                    let result = scan_file(&task, &config_, &cancel_);
                    // the receiver is gone only after the fan-in gave up
                    let _ = tx_.send((task.task_index, result));
                });
            match result {
                Ok(handle) => {
                    handles.push((task_index, handle));
                    running += 1;
                }
                Err(err) => {
                    de_err!("thread spawn failed for task {}: {}", task_index, err);
                    outputs[task_index] = Some(Err(Error::io(&paths[task_index].path, err)));
                }
            }
        }
        drop(tx);

        // fan-in
        let deadline: Option<Instant> = self.config.timeout.map(|timeout| Instant::now() + timeout);
        // every sender dropped; every scan thread has exited
        let mut disconnected: bool = false;
        while running > 0 {
            let received = match deadline {
                Some(deadline) => rx.recv_deadline(deadline),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok((task_index, result)) => {
                    defo!("task {} finished", task_index);
                    outputs[task_index] = Some(result);
                    running -= 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    de_wrn!("timeout; cancelling {} scan tasks", running);
                    self.cancel.store(true, Ordering::Relaxed);
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    de_err!("channel disconnected with {} scan tasks running", running);
                    disconnected = true;
                    break;
                }
            }
        }
        // tasks that finished after the timeout
        while let Ok((task_index, result)) = rx.try_recv() {
            defo!("task {} finished late", task_index);
            outputs[task_index] = Some(result);
        }
        // a task that sent its output is exiting; any other may be blocked in
        // a read or open that `cancel` cannot interrupt, so it is detached
        for (task_index, handle) in handles.into_iter() {
            if outputs[task_index].is_none() && !disconnected {
                de_wrn!("detaching unfinished scan thread of task {}", task_index);
                drop(handle);
                continue;
            }
            if handle.join().is_err() {
                de_err!("scan thread of task {} panicked", task_index);
            }
        }

        // merge in task order
        let mut clues: CluesByPattern = CluesByPattern::new();
        for (task_index, output) in outputs.into_iter().enumerate() {
            match output {
                Some(Ok(output)) => {
                    self.summary.files_scanned += 1;
                    self.summary.lines_read += output.lines_read;
                    for (name, mut list) in output.clues.into_iter() {
                        self.summary.clues_found += list.len() as Count;
                        clues.entry(name).or_default().append(&mut list);
                    }
                    self.errors.extend(output.errors);
                }
                Some(Err(err)) => {
                    defo!("task {} error {}", task_index, err);
                    self.errors.push(err);
                }
                None => {
                    // did not finish before the timeout; partial clues discarded
                    self.errors.push(Error::Cancelled(paths[task_index].path.clone()));
                }
            }
        }
        defx!("clues for {} patterns", clues.len());

        clues
    }

    fn process_stage3_verify(
        &mut self,
        plan: &InvestigationPlan,
        clues: &CluesByPattern,
    ) -> Vec<InvestigationResult> {
        self.assert_stage(InvestigationStage::PerLogTypeScan);
        self.stage = InvestigationStage::Verify;

        let mut results: Vec<InvestigationResult> = Vec::new();
        for rule in plan.rules().iter() {
            let effect_clue = match plan.effect_clues().get(rule.effect().name()) {
                Some(val) => val,
                None => continue,
            };
            match Verifier::verify(rule, effect_clue, clues) {
                Ok(found) => results.extend(found),
                Err(err) => {
                    defo!("rule for {:?} error {}", rule.effect().name(), err);
                    self.errors.push(err);
                }
            }
        }

        results
    }

    fn process_stage4_done(&mut self) {
        self.assert_stage(InvestigationStage::Verify);
        self.stage = InvestigationStage::Done;
    }
}

/// Investigate `effect` over `rulebase` with a new [`SearchManager`].
pub fn investigate(
    rulebase: Arc<RuleBase>,
    effect: &EffectObservation,
    config: InvestigationConfig,
) -> InvestigationOutcome {
    SearchManager::new(rulebase, config).investigate(effect)
}
