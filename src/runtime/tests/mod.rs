
use std::fs::File;
use std::io::{read_to_string, Write};

use pretty_assertions::assert_eq;

use super::{Fault, FaultKind, Object, Program, Status, Value, VmConfig, VM};

fn run_source(source: &str, config: VmConfig) -> (VM<Vec<u8>>, Result<(), Fault>) {
    run_program(Program::assemble(source).unwrap(), config, 0)
}

fn run_program(
    program: Program,
    config: VmConfig,
    entry: usize,
) -> (VM<Vec<u8>>, Result<(), Fault>) {
    let mut vm = VM::with_output(config, vec![]);

    vm.load(program);
    let result = vm.run(entry);

    (vm, result)
}

fn test_golden_program(filename: &str) {
    let file = File::open(filename).expect("test file exists");
    let contents = read_to_string(file).unwrap();
    let mut split_contents: Vec<&str> = contents.split("%%%%").collect();
    let expected_output = split_contents.pop().unwrap().trim();
    let input = split_contents.pop().unwrap().trim();
    let flags = split_contents.pop();
    let mut config = VmConfig::default();
    let mut entry = 0;

    if let Some(flags) = flags {
        for line in flags.lines() {
            let flag = line.trim();
            if flag.is_empty() {
                continue;
            }
            let mut flag_setting = flag.split('=');
            let flag = flag_setting.next().unwrap();
            let setting: usize = flag_setting.next().unwrap().parse().unwrap();

            match flag {
                "HEAP" => config = config.with_heap_capacity(setting),
                "DEPTH" => config = config.with_max_call_depth(setting),
                "ENTRY" => entry = setting,
                _ => panic!("unrecognized program flag"),
            }
        }
    }

    let (vm, result) = run_program(Program::assemble(input).unwrap(), config, entry);
    let mut found_output = String::from_utf8(vm.into_output()).unwrap();

    match result {
        Ok(()) => found_output.push_str("halt"),
        Err(fault) => found_output.push_str(&fault.to_string()),
    }

    if std::env::var("GOLDEN_UPDATE").is_ok() {
        let mut new_file = File::create(filename).expect("test file exists");
        let mut new_contents = String::new();
        if let Some(flags) = flags {
            new_contents.push_str(flags);
            new_contents.push_str("%%%%\n\n");
        }
        new_contents.push_str(input);
        new_contents.push_str("\n\n%%%%\n\n");
        new_contents.push_str(&found_output);
        new_contents.push('\n');

        new_file
            .write_all(new_contents.as_bytes())
            .expect("write to file");

        assert!(false);
    } else {
        assert_eq!(expected_output, found_output);
    }
}

#[test]
fn demo_program_calls_and_round_trips_a_property() {
    let (vm, result) = run_program(Program::demo().unwrap(), VmConfig::default(), 0);

    assert_eq!(result, Ok(()));
    assert_eq!(vm.status(), &Status::Halted);
    assert_eq!(vm.registers().get(3), Ok(Value::Int(5)));
    assert_eq!(vm.registers().get(5), Ok(Value::Int(6)));
    assert_eq!(vm.heap().live(), 1);
    assert_eq!(vm.frames().depth(), 0);
    assert!(vm.mailbox().is_empty());
    assert_eq!(vm.into_output(), b"5\n");
}

#[test]
fn fresh_vm_is_ready() {
    let vm = VM::with_output(VmConfig::default(), vec![]);

    assert_eq!(vm.status(), &Status::Ready);
    assert_eq!(vm.status().exit_code(), -1);
    assert!(vm
        .registers()
        .as_slice()
        .iter()
        .all(|v| *v == Value::Int(0)));
}

#[test]
fn invalid_opcode_leaves_state_untouched() {
    let (vm, result) = run_source("SET r0, 5\nSTORE r0\n99\nHALT", VmConfig::default());
    let fault = result.unwrap_err();

    assert_eq!(fault, Fault::new(FaultKind::InvalidOpcode { opcode: 99 }, 5));
    assert_eq!(vm.ip(), 5);
    assert_eq!(vm.status().exit_code(), 1);
    assert_eq!(vm.registers().get(0), Ok(Value::Int(5)));
    assert_eq!(vm.mailbox().iter().copied().collect::<Vec<_>>(), vec![Value::Int(5)]);
    assert_eq!(vm.frames().depth(), 0);
}

#[test]
fn heap_exhaustion_keeps_earlier_objects() {
    let config = VmConfig::default().with_heap_capacity(2);
    let (vm, result) = run_source("NEW r0 1 0\nNEW r1 1 0\nNEW r2 1 0\nHALT", config);

    assert_eq!(
        result.unwrap_err(),
        Fault::new(FaultKind::HeapExhausted { capacity: 2 }, 8)
    );
    assert!(vm.registers().get(0).unwrap().as_object().is_ok());
    assert!(vm.registers().get(1).unwrap().as_object().is_ok());
    assert_eq!(vm.registers().get(2), Ok(Value::Int(0)));
    assert_eq!(vm.heap().live(), 2);
}

#[test]
fn local_instructions_record_the_written_value() {
    let source = "
        SETL    r0, 4
        SET     r1, 6
        ADDL    r0, r1, r2
        STORE   r2
        LOAD    r3
        NEW     r4, 1, 0
        SETPROP r4, 0, 9, INT
        PROP    r4, r5, 0, INT
        HALT
    ";
    let (vm, result) = run_source(source, VmConfig::default());
    let frame = vm.frames().current();

    assert_eq!(result, Ok(()));
    assert_eq!(
        frame.iter().collect::<Vec<_>>(),
        vec![
            (0, Value::Int(4)),
            (2, Value::Int(10)),
            (3, Value::Int(10)),
            (5, Value::Int(9)),
        ]
    );
}

#[test]
fn plain_instructions_do_not_record() {
    let source = "
        SET     r0, 1
        ADD     r0, r0, r1
        CAST    r1, INT
        NEW     r2, 0, 0
        HALT
    ";
    let (vm, result) = run_source(source, VmConfig::default());

    assert_eq!(result, Ok(()));
    assert!(vm.frames().current().is_empty());
}

#[test]
fn call_pushes_the_following_address() {
    let mut vm = VM::with_output(VmConfig::default(), vec![]);

    vm.load(Program::assemble("CALL target\nHALT\ntarget:\nHALT").unwrap());
    assert_eq!(vm.step(), Ok(false));

    assert_eq!(vm.ip(), 3);
    assert_eq!(vm.frames().depth(), 1);
    assert_eq!(vm.mailbox().front(), Some(&Value::Int(2)));
}

#[test]
fn send_restores_the_caller_frame_and_keeps_the_rest() {
    let source = "
        SETL    r0, 1
        STORE   r0
        CALL    callee
        HALT
    callee:
        LOAD    r7
        SET     r0, 50
        SET     r1, 60
        STORE   r7
        SEND
    ";
    let (vm, result) = run_source(source, VmConfig::default());

    assert_eq!(result, Ok(()));
    assert_eq!(vm.registers().get(0), Ok(Value::Int(1)));
    assert_eq!(vm.registers().get(1), Ok(Value::Int(60)));
    assert_eq!(vm.ip(), 7);
    assert_eq!(vm.mailbox().iter().copied().collect::<Vec<_>>(), vec![Value::Int(1)]);
}

#[test]
fn send_with_reference_in_front_is_a_type_mismatch() {
    let source = "
        NEW     r0, 1, 0
        CALL    callee
        HALT
    callee:
        LOAD    r1
        STORE   r0
        SEND
    ";
    let (vm, result) = run_source(source, VmConfig::default());
    let fault = result.unwrap_err();

    assert_eq!(
        fault,
        Fault::new(
            FaultKind::TypeMismatch {
                expected: "int",
                actual: "ref",
            },
            11
        )
    );
    assert_eq!(vm.frames().depth(), 1);
    assert_eq!(vm.mailbox().len(), 1);
}

#[test]
fn register_index_past_the_file_is_out_of_range() {
    let (vm, result) = run_source("SET r1, 9\nSET r50, 1\nHALT", VmConfig::default());

    assert_eq!(
        result.unwrap_err().kind,
        FaultKind::OperandOutOfRange {
            operand: "register",
            index: 50,
            limit: 50,
        }
    );
    assert_eq!(vm.ip(), 3);
    assert_eq!(vm.status().exit_code(), 2);
}

#[test]
fn load_into_bad_register_does_not_consume_the_mailbox() {
    let (vm, result) = run_source("STORE r0\nLOAD r77\nHALT", VmConfig::default());

    assert!(matches!(
        result.unwrap_err().kind,
        FaultKind::OperandOutOfRange { .. }
    ));
    assert_eq!(vm.mailbox().len(), 1);
}

#[test]
fn property_access_checks_its_operands() {
    let (_, result) = run_source("SET r0, 1\nPROP r0 r1 0 INT\nHALT", VmConfig::default());
    assert_eq!(
        result.unwrap_err().kind,
        FaultKind::TypeMismatch {
            expected: "ref",
            actual: "int",
        }
    );

    let (_, result) = run_source("NEW r0 1 0\nPROP r0 r1 1 INT\nHALT", VmConfig::default());
    assert_eq!(
        result.unwrap_err().kind,
        FaultKind::OperandOutOfRange {
            operand: "property",
            index: 1,
            limit: 1,
        }
    );

    let (_, result) = run_source("NEW r0 1 0\nSETPROP r0 0 3 7\nHALT", VmConfig::default());
    assert_eq!(result.unwrap_err().kind, FaultKind::UnsupportedCast { tag: 7 });
}

#[test]
fn references_do_not_cast_or_print() {
    let (_, result) = run_source("NEW r0 0 0\nCAST r0 INT\nHALT", VmConfig::default());
    assert_eq!(result.unwrap_err().kind, FaultKind::UnsupportedCast { tag: 0 });

    let (vm, result) = run_source("NEW r0 0 0\nPUTINT r0\nHALT", VmConfig::default());
    assert!(matches!(
        result.unwrap_err().kind,
        FaultKind::TypeMismatch { .. }
    ));
    assert!(vm.output().is_empty());
}

#[test]
fn identical_runs_are_identical() {
    let first = run_program(Program::demo().unwrap(), VmConfig::default(), 0);
    let second = run_program(Program::demo().unwrap(), VmConfig::default(), 0);

    assert_eq!(first.1, second.1);
    assert_eq!(first.0.registers().as_slice(), second.0.registers().as_slice());
    assert_eq!(first.0.into_output(), second.0.into_output());
}

#[test]
fn destroyed_objects_free_their_slot() {
    let config = VmConfig::default().with_heap_capacity(1);
    let (mut vm, result) = run_source("NEW r0 2 0\nHALT", config);
    assert_eq!(result, Ok(()));

    let obj = vm.registers().get(0).unwrap().as_object().unwrap();
    let object = vm.destroy(obj).unwrap();

    assert_eq!(object.prop_count(), 2);
    assert_eq!(vm.heap().live(), 0);
    assert!(vm.destroy(obj).is_err());

    let again = vm.heap_mut().alloc(object).unwrap();
    assert_eq!(again.slot(), obj.slot());
    assert_ne!(again, obj);
}

#[test]
fn stale_handles_fault_after_slot_reuse() {
    let source = "
        NEW     r0, 1, 0
        SETPROP r0, 0, 5, INT
        HALT
    read:
        PROP    r0, r1, 0, INT
        HALT
    write:
        SETPROP r0, 0, 9, INT
        HALT
    ";
    let config = VmConfig::default().with_heap_capacity(1);
    let (mut vm, result) = run_source(source, config);
    assert_eq!(result, Ok(()));

    let old = vm.registers().get(0).unwrap().as_object().unwrap();
    vm.destroy(old).unwrap();

    let mut replacement = Object::new(1, 0);
    replacement.set_prop(0, Value::Int(77)).unwrap();
    let new = vm.heap_mut().alloc(replacement).unwrap();
    assert_eq!(new.slot(), old.slot());

    let stale = FaultKind::OperandOutOfRange {
        operand: "object",
        index: 0,
        limit: 1,
    };

    assert_eq!(vm.run(10), Err(Fault::new(stale.clone(), 10)));
    assert_eq!(vm.registers().get(1), Ok(Value::Int(0)));
    assert!(vm.frames().current().get(1).is_none());

    assert_eq!(vm.run(16), Err(Fault::new(stale, 16)));
    assert_eq!(vm.heap().get(new).unwrap().prop(0), Ok(Value::Int(77)));
}

#[test]
fn dump_shows_the_faulting_state() {
    let (vm, result) = run_source("SET r0, 2\nSTORE r0\nSTORE r0\nSEND", VmConfig::default());
    assert!(result.is_err());

    let text = vm.dump().render(false);

    assert!(text.contains("status: fault at ip 7: return without call (exit code 8)"));
    assert!(text.contains("instruction: SEND"));
    assert!(text.contains("[2, 2]"));
    assert!(text.contains("live: 0/256"));
    assert_eq!(text, vm.dump().to_string());
}

#[test]
fn call_outside_the_program_faults_in_place() {
    let (vm, result) = run_source("SET r0, 1\nCALL 60000\nHALT", VmConfig::default());

    assert_eq!(
        result,
        Err(Fault::new(
            FaultKind::OperandOutOfRange {
                operand: "address",
                index: 60000,
                limit: 6,
            },
            3
        ))
    );
    assert_eq!(vm.ip(), 3);
    assert_eq!(vm.frames().depth(), 0);
    assert!(vm.mailbox().is_empty());
}

#[test]
fn send_to_an_address_outside_the_program_faults_in_place() {
    let source = "
        SET     r0, 500
        STORE   r0
        CALL    callee
        HALT
    callee:
        SEND
    ";
    let (vm, result) = run_source(source, VmConfig::default());

    assert_eq!(
        result,
        Err(Fault::new(
            FaultKind::OperandOutOfRange {
                operand: "address",
                index: 500,
                limit: 9,
            },
            8
        ))
    );
    assert_eq!(vm.frames().depth(), 1);
    assert_eq!(
        vm.mailbox().iter().copied().collect::<Vec<_>>(),
        vec![Value::Int(500), Value::Int(7)]
    );
}

#[test]
fn dump_colors_only_when_asked() {
    let (vm, _) = run_source("SET r0, 1\nHALT", VmConfig::default());
    let dump = vm.dump();

    assert!(!dump.render(false).contains('\x1b'));
    assert!(dump.render(true).contains('\x1b'));
    assert_eq!(dump.render(true), format!("{dump:#}"));
    assert!(dump.render(true).contains("status: halted (exit code 0)"));
}
