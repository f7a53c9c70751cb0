/// Match phase
///
/// Runs pattern instructions up to COMMIT. `MatchSome` takes the longest
/// admissible run first and records a choice point; a later mismatch pops
/// back to the most recent choice point and retries one character shorter,
/// down to the run's minimum. The choice stack lives in `Scratch`, so
/// backtracking never recurses.
use super::RuleExecutor;
use crate::ocp_vm::opcode::OpFamily;
use crate::ocp_vm::{FaultKind, OpCode, Phase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChoicePoint {
    /// Instruction after the MATCHSOME/EXTRAARG pair
    resume: usize,
    /// Match length before the run
    base: usize,
    /// Current run length
    run: usize,
    min: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PatternOutcome {
    Matched { len: usize, commit: usize },
    Failed { hit_end: bool },
    Starved,
    Stopped,
}

/// Result of one match instruction
enum Step {
    /// Matched; new match length
    Next(usize),
    Mismatch,
    /// Needs a character past the end of the pending input
    End,
}

impl RuleExecutor<'_, '_> {
    pub(super) fn match_pattern(&mut self) -> Result<PatternOutcome, FaultKind> {
        let mut pc = 0;
        let mut len = 0;
        let mut hit_end = false;

        loop {
            let instruction = *self.code.get(pc).ok_or(FaultKind::InvalidProgram)?;
            if !self.notify(pc, Phase::Match, len, instruction) {
                return Ok(PatternOutcome::Stopped);
            }
            let op = instruction.try_opcode().ok_or(FaultKind::InvalidProgram)?;

            let step = match op {
                OpCode::Commit => return Ok(PatternOutcome::Matched { len, commit: pc }),
                OpCode::MatchChar => self.match_code(len, instruction.arg() as i64),
                // A shrunken run can leave a reference pointing past the
                // match; that position simply cannot match
                OpCode::MatchRef => match self.char_ref(len, instruction.arg()) {
                    Ok(code) => self.match_code(len, code as i64),
                    Err(_) => Step::Mismatch,
                },
                OpCode::MatchLast => match self.last_char(len, instruction.arg()) {
                    Ok(code) => self.match_code(len, code as i64),
                    Err(_) => Step::Mismatch,
                },
                OpCode::MatchValue => {
                    let value = self.pop()?;
                    self.match_code(len, value)
                }
                OpCode::MatchSome => {
                    let max = self.extra_arg(pc)?;
                    match self.match_some(pc, len, instruction.arg(), max) {
                        SomeStep::Taken(new_len) => {
                            len = new_len;
                            pc += 2;
                            continue;
                        }
                        SomeStep::Short => Step::End,
                        SomeStep::Starved => return Ok(PatternOutcome::Starved),
                    }
                }
                op if op.family() == OpFamily::Arith => match self.exec_arith(instruction, len) {
                    Ok(()) => {
                        pc += 1;
                        continue;
                    }
                    Err(FaultKind::ReferenceOutOfRange { .. }) => Step::Mismatch,
                    Err(kind) => return Err(kind),
                },
                _ => return Err(FaultKind::InvalidProgram),
            };

            match step {
                Step::Next(new_len) => {
                    len = new_len;
                    pc += 1;
                    continue;
                }
                Step::End if !self.finished => return Ok(PatternOutcome::Starved),
                Step::End => hit_end = true,
                Step::Mismatch => {}
            }

            match self.backtrack() {
                Some((resume, shorter)) => {
                    pc = resume;
                    len = shorter;
                }
                None => return Ok(PatternOutcome::Failed { hit_end }),
            }
        }
    }

    #[inline(always)]
    fn match_code(&self, len: usize, value: i64) -> Step {
        match self.input.get(len) {
            None => Step::End,
            Some(&code) if code as i64 == value => Step::Next(len + 1),
            Some(_) => Step::Mismatch,
        }
    }

    /// Greedy run of `min..=max` characters, `max == 0` meaning unbounded.
    /// An unbounded run right before COMMIT has nothing after it to limit
    /// it and takes the shortest admissible run instead.
    fn match_some(&mut self, pc: usize, len: usize, min: u32, max: u32) -> SomeStep {
        let (min, max) = (min as usize, max as usize);
        let avail = self.input.len() - len;
        let trailing = self.code.get(pc + 2).and_then(|i| i.try_opcode()) == Some(OpCode::Commit);

        let (run, limited) = if max == 0 && trailing {
            let want = min.max(1);
            if avail >= want {
                (want, false)
            } else {
                (avail, true)
            }
        } else if max == 0 {
            (avail, true)
        } else {
            (max.min(avail), avail < max)
        };

        // More input could change which run length wins
        if limited && !self.finished {
            return SomeStep::Starved;
        }
        if run < min {
            return SomeStep::Short;
        }
        if run > min {
            self.scratch.choices.push(ChoicePoint {
                resume: pc + 2,
                base: len,
                run,
                min,
            });
        }
        SomeStep::Taken(len + run)
    }

    /// Shorten the most recent run by one; `(resume pc, match length)`
    fn backtrack(&mut self) -> Option<(usize, usize)> {
        let choice = self.scratch.choices.last_mut()?;
        choice.run -= 1;
        let resume = choice.resume;
        let len = choice.base + choice.run;
        if choice.run == choice.min {
            self.scratch.choices.pop();
        }
        self.scratch.stack.clear();
        Some((resume, len))
    }
}

enum SomeStep {
    Taken(usize),
    Short,
    Starved,
}
