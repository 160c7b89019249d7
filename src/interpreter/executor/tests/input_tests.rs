//! Tests for input: buffered reads, suspension and the async driver

use std::collections::VecDeque;
use std::path::Path;

use super::helpers::{build_vm, parse_and_round_trip, printed, recording_sink};
use crate::errors::{Error, ExecError};
use crate::interpreter::executor::{
    run, run_interactive, run_streaming, run_until_done, run_until_suspended, step, RunOptions,
    Step, VM,
};
use crate::interpreter::types::{Control, InputRequest, Val};

const GREETER: &str = "\
# main

> name

**Hello, {name}!**

> age

**{name} is {age}**
";

fn request(variable: &str) -> InputRequest {
    InputRequest {
        variable: variable.to_string(),
    }
}

/* ===================== Buffered ===================== */

#[test]
fn test_buffered_inputs_consumed_in_order() {
    let mut vm = build_vm(GREETER).with_inputs(vec![Val::from("Ada"), Val::from("36")]);
    run_until_done(&mut vm).unwrap();
    assert_eq!(printed(&vm.output), vec!["Hello, Ada!", "Ada is 36"]);
}

#[test]
fn test_exhausted_buffer_reads_null() {
    let mut vm = build_vm(GREETER).with_inputs(vec![Val::from("Ada")]);
    run_until_done(&mut vm).unwrap();
    assert_eq!(printed(&vm.output), vec!["Hello, Ada!", "Ada is null"]);
}

#[test]
fn test_input_binds_in_current_frame() {
    let source = "# main\n\n[](#ask)\n\n**{answer}**\n\n# ask\n\n> answer\n\n**got {answer}**\n";
    let mut vm = build_vm(source).with_inputs(vec![Val::from("yes")]);
    run_until_done(&mut vm).unwrap();
    assert_eq!(printed(&vm.output), vec!["got yes", "undefined"]);
}

#[test]
fn test_run_with_inputs_and_sink() {
    let program = parse_and_round_trip(GREETER, Path::new("."));
    let (sink, seen) = recording_sink();
    let options = RunOptions {
        inputs: vec![Val::from("Bo"), Val::Num(7.0)],
        ..RunOptions::default()
    };

    let output = run(program, options, Some(sink)).unwrap();

    assert_eq!(printed(&output), vec!["Hello, Bo!", "Bo is 7"]);
    assert_eq!(*seen.lock().unwrap(), printed(&output));
}

/* ===================== Suspension ===================== */

#[test]
fn test_interactive_input_suspends_until_provided() {
    let mut vm = build_vm(GREETER).interactive();

    assert_eq!(
        run_until_suspended(&mut vm).unwrap(),
        Step::Suspended(request("name"))
    );
    assert_eq!(vm.control, Control::AwaitingInput(request("name")));

    // Stepping a suspended VM makes no progress
    assert_eq!(step(&mut vm).unwrap(), Step::Suspended(request("name")));
    assert!(vm.output.is_empty());

    vm.provide_input(Val::from("Cy")).unwrap();
    assert_eq!(vm.control, Control::None);
    assert_eq!(
        run_until_suspended(&mut vm).unwrap(),
        Step::Suspended(request("age"))
    );
    assert_eq!(printed(&vm.output), vec!["Hello, Cy!"]);

    vm.provide_input(Val::from("9")).unwrap();
    assert_eq!(run_until_suspended(&mut vm).unwrap(), Step::Done);
    assert_eq!(printed(&vm.output), vec!["Hello, Cy!", "Cy is 9"]);
}

#[test]
fn test_provide_input_when_not_waiting_fails() {
    let mut vm = build_vm(GREETER).interactive();
    assert_eq!(
        vm.provide_input(Val::from("early")),
        Err(ExecError::UnexpectedInput)
    );
}

#[test]
fn test_run_until_done_reports_pending_input() {
    let mut vm = build_vm(GREETER).interactive();
    let err = run_until_done(&mut vm).unwrap_err();
    assert!(matches!(
        err,
        Error::Exec(ExecError::InputRequired { ref variable }) if variable == "name"
    ));
}

/* ===================== Async Driver ===================== */

#[test]
fn test_run_interactive_asks_provider() {
    let mut vm: VM = build_vm(GREETER).interactive();
    let mut answers: VecDeque<Val> = VecDeque::from(vec![Val::from("Di"), Val::Num(40.0)]);
    let mut asked = Vec::new();

    tokio_test::block_on(run_interactive(&mut vm, |request| {
        asked.push(request.variable);
        let answer = answers.pop_front().unwrap_or(Val::Null);
        async move { answer }
    }))
    .unwrap();

    assert_eq!(asked, vec!["name", "age"]);
    assert_eq!(printed(&vm.output), vec!["Hello, Di!", "Di is 40"]);
}

#[test]
fn test_run_streaming_forwards_output_as_produced() {
    let program = parse_and_round_trip(GREETER, Path::new("."));
    let (sink, seen) = recording_sink();
    let seen_at_prompt = seen.clone();
    let mut prompts = Vec::new();

    let output = tokio_test::block_on(run_streaming(
        program,
        RunOptions::default(),
        sink,
        |request| {
            prompts.push((request.variable, seen_at_prompt.lock().unwrap().len()));
            async { Val::from("Ed") }
        },
    ))
    .unwrap();

    // The greeting was streamed before the second prompt
    assert_eq!(prompts, vec![("name".to_string(), 0), ("age".to_string(), 1)]);
    assert_eq!(printed(&output), vec!["Hello, Ed!", "Ed is Ed"]);
    assert_eq!(*seen.lock().unwrap(), printed(&output));
}

#[test]
fn test_run_streaming_ignores_buffered_inputs() {
    let program = parse_and_round_trip("# main\n\n> x\n\n**{x}**\n", Path::new("."));
    let (sink, _seen) = recording_sink();
    let options = RunOptions {
        inputs: vec![Val::from("buffered")],
        ..RunOptions::default()
    };

    let output = tokio_test::block_on(run_streaming(program, options, sink, |_| async {
        Val::from("live")
    }))
    .unwrap();

    assert_eq!(output, vec![Val::from("live")]);
}
