// Observer hooks
use super::program;
use crate::*;
use pretty_assertions::assert_eq;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Clone, Default)]
struct Counter {
    rules: Rc<Cell<usize>>,
    instructions: Rc<Cell<usize>>,
}

impl Observer for Counter {
    fn on_rule(&mut self, _ctx: &TraceContext<'_>) -> bool {
        self.rules.set(self.rules.get() + 1);
        true
    }

    fn on_instruction(&mut self, _ctx: &TraceContext<'_>, _instruction: Instruction) -> bool {
        self.instructions.set(self.instructions.get() + 1);
        true
    }
}

const SOURCE: &str = r#"state S: "a" -> "1"; "b" -> "2";"#;

#[test]
fn test_observer_sees_every_instruction() {
    let program = program(SOURCE);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);

    let mut machine = Machine::new(&program);
    machine.attach_observer(Box::new(move |ctx: &TraceContext<'_>, i: Instruction| {
        log.borrow_mut().push((ctx.rule, ctx.pc, ctx.phase, i.opcode()));
        true
    }));
    machine.feed_str("b");
    machine.finish();
    assert_eq!(machine.run(), Ok(Status::Halted));

    assert_eq!(
        *seen.borrow(),
        vec![
            (0, 0, Phase::Match, OpCode::MatchChar),
            (1, 0, Phase::Match, OpCode::MatchChar),
            (1, 1, Phase::Match, OpCode::Commit),
            (1, 2, Phase::Action, OpCode::OutNum),
            (1, 3, Phase::Action, OpCode::Stay),
        ]
    );
    assert_eq!(machine.output(), &to_codes("2")[..]);
}

#[test]
fn test_observer_reads_runtime_state() {
    let program = program(SOURCE);
    let checked = Rc::new(RefCell::new(false));
    let flag = Rc::clone(&checked);

    let mut machine = Machine::new(&program);
    machine.attach_observer(Box::new(move |ctx: &TraceContext<'_>, i: Instruction| {
        if i.opcode() == OpCode::OutNum && ctx.rule == 1 {
            assert_eq!(ctx.state_name(), "S");
            assert_eq!(ctx.matched_input(), &[98u32]);
            assert_eq!(ctx.output, &[49u32]);
            assert_eq!(ctx.position, 1);
            *flag.borrow_mut() = true;
        }
        true
    }));
    machine.feed_str("ab");
    machine.finish();
    machine.run().unwrap();
    assert!(*checked.borrow());
}

#[test]
fn test_observer_can_stop_before_effects() {
    let program = program(SOURCE);
    let mut machine = Machine::new(&program);
    machine.attach_observer(Box::new(|_: &TraceContext<'_>, i: Instruction| {
        i.opcode() != OpCode::OutNum
    }));
    machine.feed_str("b");
    machine.finish();

    assert_eq!(machine.run(), Ok(Status::Stopped));
    assert!(machine.output().is_empty());
    assert_eq!(machine.position(), 0);
    assert_eq!(machine.step(), Ok(false));

    assert!(machine.detach_observer().is_some());
    machine.resume();
    assert_eq!(machine.run(), Ok(Status::Halted));
    assert_eq!(machine.output(), &to_codes("2")[..]);
}

#[test]
fn test_rule_and_instruction_counts() {
    let program = program(SOURCE);
    let counter = Counter::default();

    let mut machine = Machine::new(&program);
    machine.attach_observer(Box::new(counter.clone()));
    machine.feed_str("ab");
    machine.finish();
    machine.run().unwrap();

    // "a": rule 0 hits (4 instructions); "b": rule 0 misses (1), rule 1 hits (4)
    assert_eq!(counter.rules.get(), 3);
    assert_eq!(counter.instructions.get(), 9);
}

#[test]
fn test_observer_does_not_change_results() {
    let program = program(r#"state S: "<" \* ">" -> \(*+1-1); \* -> \$;"#);
    let plain = execute_str(&program, "<a>b<c").unwrap();

    let mut machine = Machine::new(&program);
    machine.attach_observer(Box::new(|_: &TraceContext<'_>, _: Instruction| true));
    machine.feed_str("<a>b<c");
    machine.finish();
    machine.run().unwrap();
    assert!(machine.has_observer());
    assert_eq!(machine.take_output_string().unwrap(), plain);
}
