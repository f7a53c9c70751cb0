use crate::ocp_vm::execute::{Applied, RuleExecutor, RuleOutcome, Scratch};
use crate::ocp_vm::input_window::InputWindow;
use crate::ocp_vm::{FaultKind, NoMatchPolicy, Observer, OcpResult, RuntimeError, VmOptions};
use crate::program::{Program, StateId};

/// Where the machine stands between steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Pending input can be processed
    Ready,
    /// Waiting for `feed` or `finish`
    NeedsInput,
    /// End of input reached, or a fault occurred
    Halted,
    /// An observer asked to stop; `resume` continues
    Stopped,
}

/// Streaming executor for one program.
///
/// The program is borrowed read-only; any number of machines may run the
/// same program at once. All mutable state belongs to the machine.
pub struct Machine<'p> {
    program: &'p Program,
    options: VmOptions,
    window: InputWindow,
    output: Vec<u32>,
    state: StateId,
    finished: bool,
    status: Status,
    steps: u64,
    /// Steps since the input last moved past `frontier`
    idle_steps: u64,
    /// Furthest net progress through the fed input
    frontier: i64,
    scratch: Scratch,
    observer: Option<Box<dyn Observer + 'p>>,
}

impl<'p> Machine<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self::with_options(program, VmOptions::default())
    }

    pub fn with_options(program: &'p Program, options: VmOptions) -> Self {
        log::debug!(
            "machine starts in state `{}`, {:?}",
            program.state_name(program.entry()),
            options
        );
        Machine {
            program,
            options,
            window: InputWindow::new(),
            output: Vec::new(),
            state: program.entry(),
            finished: false,
            status: Status::Ready,
            steps: 0,
            idle_steps: 0,
            frontier: 0,
            scratch: Scratch::default(),
            observer: None,
        }
    }

    // ===== Input =====

    /// Append input. Ignored once `finish` has been called.
    pub fn feed(&mut self, data: &[u32]) {
        if self.finished {
            log::warn!("dropping {} characters fed after end of input", data.len());
            return;
        }
        self.window.feed(data);
        if self.status == Status::NeedsInput {
            self.status = Status::Ready;
        }
    }

    pub fn feed_str(&mut self, text: &str) {
        self.feed(&crate::to_codes(text));
    }

    /// Mark end of input. Pending partial matches resolve against it.
    pub fn finish(&mut self) {
        self.finished = true;
        if self.status == Status::NeedsInput {
            self.status = Status::Ready;
        }
    }

    // ===== Execution =====

    /// Apply one rule, or the no-match policy, at the current position.
    /// Returns `false` when nothing could be applied; `status` says why.
    pub fn step(&mut self) -> OcpResult<bool> {
        match self.status {
            Status::Halted | Status::Stopped => return Ok(false),
            Status::Ready | Status::NeedsInput => {}
        }

        if self.window.is_empty() {
            if self.finished {
                log::debug!(
                    "halted in state `{}` after {} steps, {} characters out",
                    self.state_name(),
                    self.steps,
                    self.output.len()
                );
                self.status = Status::Halted;
            } else {
                self.status = Status::NeedsInput;
            }
            return Ok(false);
        }

        // Only steps that never get further into the input count
        if let Some(limit) = self.options.max_steps.filter(|&limit| self.idle_steps >= limit) {
            return Err(self.fault(FaultKind::StepLimit(limit), None));
        }

        let program = self.program;
        let Some(state) = program.state(self.state) else {
            return Err(self.fault(FaultKind::InvalidProgram, None));
        };

        let mut hit_end = false;
        for (index, rule) in state.rules.iter().enumerate() {
            let executor = RuleExecutor {
                program,
                state: self.state,
                rule: index,
                code: &rule.code,
                input: self.window.pending(),
                finished: self.finished,
                position: self.window.consumed(),
                output: &self.output,
                scratch: &mut self.scratch,
                observer: self.observer.as_deref_mut(),
            };

            match executor.run() {
                Ok(RuleOutcome::Applied(applied)) => {
                    self.commit(index, applied);
                    return Ok(true);
                }
                Ok(RuleOutcome::Failed { hit_end: end }) => hit_end |= end,
                Ok(RuleOutcome::Starved) => {
                    self.status = Status::NeedsInput;
                    return Ok(false);
                }
                Ok(RuleOutcome::Stopped) => {
                    log::debug!("stopped by observer at position {}", self.position());
                    self.status = Status::Stopped;
                    return Ok(false);
                }
                Err(kind) => return Err(self.fault(kind, Some(index))),
            }
        }

        self.apply_no_match(hit_end)
    }

    /// Step until the machine needs input, halts, or is stopped
    pub fn run(&mut self) -> OcpResult<Status> {
        while self.step()? {}
        Ok(self.status)
    }

    /// Clear an observer stop so the next step retries the same position
    pub fn resume(&mut self) {
        if self.status == Status::Stopped {
            self.status = Status::Ready;
        }
    }

    /// Back to the entry state with empty buffers. Options and the
    /// observer are kept.
    pub fn reset(&mut self) {
        self.window.clear();
        self.output.clear();
        self.scratch.clear();
        self.state = self.program.entry();
        self.finished = false;
        self.status = Status::Ready;
        self.steps = 0;
        self.idle_steps = 0;
        self.frontier = 0;
    }

    fn commit(&mut self, rule: usize, applied: Applied) {
        log::trace!(
            "state `{}` rule {} consumed {} emitted {} requeued {}",
            self.state_name(),
            rule,
            applied.consumed,
            self.scratch.emitted.len(),
            self.scratch.requeued.len()
        );
        self.window.advance(applied.consumed);
        self.window.push_back(&self.scratch.requeued);
        self.output.extend_from_slice(&self.scratch.emitted);
        if let Some(next) = applied.next {
            self.state = next;
        }
        self.count_step();
    }

    fn apply_no_match(&mut self, hit_end: bool) -> OcpResult<bool> {
        match self.options.no_match {
            NoMatchPolicy::Fault => {
                let kind = if hit_end {
                    FaultKind::UnterminatedMatch
                } else {
                    FaultKind::NoMatchingRule
                };
                Err(self.fault(kind, None))
            }
            NoMatchPolicy::PassThrough => {
                if let Some(&code) = self.window.pending().first() {
                    self.output.push(code);
                }
                self.window.advance(1);
                self.count_step();
                Ok(true)
            }
            NoMatchPolicy::Drop => {
                self.window.advance(1);
                self.count_step();
                Ok(true)
            }
        }
    }

    fn count_step(&mut self) {
        self.steps += 1;
        let progress = self.window.progress();
        if progress > self.frontier {
            self.frontier = progress;
            self.idle_steps = 0;
        } else {
            self.idle_steps += 1;
        }
    }

    /// Halt and describe the fault
    fn fault(&mut self, kind: FaultKind, rule: Option<usize>) -> RuntimeError {
        self.status = Status::Halted;
        let err = self.error(kind, rule);
        log::debug!("{err}");
        err
    }

    fn error(&self, kind: FaultKind, rule: Option<usize>) -> RuntimeError {
        RuntimeError {
            kind,
            state: self.state_name().into(),
            position: self.position(),
            rule,
        }
    }

    // ===== Observer =====

    pub fn attach_observer(&mut self, observer: Box<dyn Observer + 'p>) {
        self.observer = Some(observer);
    }

    pub fn detach_observer(&mut self) -> Option<Box<dyn Observer + 'p>> {
        self.observer.take()
    }

    pub fn has_observer(&self) -> bool {
        self.observer.is_some()
    }

    // ===== Accessors =====

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn options(&self) -> &VmOptions {
        &self.options
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn state(&self) -> StateId {
        self.state
    }

    pub fn state_name(&self) -> &'p str {
        self.program.state_name(self.state)
    }

    /// Characters consumed so far; requeued values are consumed again
    pub fn position(&self) -> usize {
        self.window.consumed()
    }

    pub fn pending(&self) -> &[u32] {
        self.window.pending()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn output(&self) -> &[u32] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.output)
    }

    /// Take the output as text; a code that is not a `char` is a fault
    pub fn take_output_string(&mut self) -> OcpResult<String> {
        let mut text = String::with_capacity(self.output.len());
        for &code in &self.output {
            match char::from_u32(code) {
                Some(ch) => text.push(ch),
                None => return Err(self.error(FaultKind::InvalidCharacter(code), None)),
            }
        }
        self.output.clear();
        Ok(text)
    }
}
