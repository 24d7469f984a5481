mod common;

use anyhow::Result;
use common::{FixedSensors, RecordingDevice};
use std::time::Duration;
use thermolang_eval::{
    Command, Config, EvalError, Interpreter, PassReport, RuntimeError, Step, TriggerMode, Value,
};
use thermolang_syntax::{FanSpeed, Mode, Power, Program, Sensor, parse_source};

fn run_pass<D, S>(interpreter: &mut Interpreter<'_, D, S>) -> PassReport
where
    D: thermolang_eval::Device,
    S: thermolang_eval::Sensors,
{
    loop {
        if let Step::PassComplete(report) = interpreter.step() {
            return report;
        }
    }
}

fn setup(source: &str) -> Result<(Program, RecordingDevice, FixedSensors)> {
    Ok((parse_source(source)?, RecordingDevice::new(), FixedSensors::new()))
}

#[test]
fn test_level_triggered_rule_fires_every_pass() -> Result<()> {
    let (program, device, sensors) = setup("RULE HUMIDITY GT 60 { SET FAN = HIGH }")?;
    sensors.set(Sensor::Humidity, 70);
    let mut interpreter = Interpreter::new(&program, device.clone(), sensors.clone());

    for pass in 1..=3 {
        let report = run_pass(&mut interpreter);
        assert_eq!(report.pass, pass);
        assert_eq!(report.fired, vec!["#0".to_string()]);
    }
    assert_eq!(device.commands(), vec![Command::Fan(FanSpeed::High); 3]);
    Ok(())
}

#[test]
fn test_false_condition_never_fires() -> Result<()> {
    let (program, device, sensors) = setup("RULE HUMIDITY GT 60 { SET FAN = HIGH }")?;
    sensors.set(Sensor::Humidity, 60);
    let mut interpreter = Interpreter::new(&program, device.clone(), sensors.clone());

    let report = run_pass(&mut interpreter);
    assert!(report.fired.is_empty());
    assert!(device.commands().is_empty());
    Ok(())
}

#[test]
fn test_set_temp_evaluates_expression() -> Result<()> {
    let (program, device, sensors) = setup("SET TEMP = 3 + 4 * 2")?;
    let mut interpreter = Interpreter::new(&program, device.clone(), sensors);

    run_pass(&mut interpreter);
    assert_eq!(device.commands(), vec![Command::Temp(11)]);
    assert_eq!(interpreter.state().setpoint, 11);
    Ok(())
}

#[test]
fn test_later_rules_win_within_a_pass() -> Result<()> {
    let (program, device, sensors) = setup(
        r#"
        RULE first: 1 { SET MODE = COOL }
        RULE second: 1 { SET MODE = HEAT }
        "#,
    )?;
    let mut interpreter = Interpreter::new(&program, device.clone(), sensors);

    let report = run_pass(&mut interpreter);
    assert_eq!(report.fired, vec!["first".to_string(), "second".to_string()]);
    assert_eq!(device.commands(), vec![Command::Mode(Mode::Cool), Command::Mode(Mode::Heat)]);
    assert_eq!(interpreter.state().mode, Mode::Heat);
    Ok(())
}

#[test]
fn test_variables_persist_across_passes() -> Result<()> {
    let (program, device, sensors) = setup(
        r#"
        RULE reset: TIME LT 100 { SET count = 0 }
        RULE tally: TIME GE 100 { SET count = count + 1 }
        "#,
    )?;
    sensors.set(Sensor::Time, 50);
    let mut interpreter = Interpreter::new(&program, device, sensors.clone());
    run_pass(&mut interpreter);

    sensors.set(Sensor::Time, 200);
    run_pass(&mut interpreter);
    run_pass(&mut interpreter);

    assert_eq!(interpreter.environment().get("count"), Some(&Value::Integer(2)));
    Ok(())
}

#[test]
fn test_repeat_zero_skips_body() -> Result<()> {
    let (program, device, sensors) = setup("REPEAT 0 { SET FAN = LOW }")?;
    let mut interpreter = Interpreter::new(&program, device.clone(), sensors);

    let report = run_pass(&mut interpreter);
    assert!(report.faults.is_empty());
    assert!(device.commands().is_empty());
    Ok(())
}

#[test]
fn test_repeat_runs_body_count_times() -> Result<()> {
    let (program, device, sensors) = setup("SET t = 20  REPEAT 3 { SET t = t + 1  SET TEMP = t }")?;
    let mut interpreter = Interpreter::new(&program, device.clone(), sensors);

    run_pass(&mut interpreter);
    assert_eq!(
        device.commands(),
        vec![Command::Temp(21), Command::Temp(22), Command::Temp(23)]
    );
    Ok(())
}

#[test]
fn test_negative_repeat_count_faults() -> Result<()> {
    let (program, device, sensors) = setup("REPEAT -1 { SET FAN = LOW }")?;
    let mut interpreter = Interpreter::new(&program, device.clone(), sensors);

    let report = run_pass(&mut interpreter);
    assert_eq!(report.faults.len(), 1);
    assert!(matches!(
        &report.faults[0].error,
        RuntimeError::InvalidRepeatCount { count: Value::Integer(-1), .. }
    ));
    assert!(device.commands().is_empty());
    Ok(())
}

#[test]
fn test_while_false_never_runs() -> Result<()> {
    let (program, device, sensors) = setup("WHILE 0 { SET FAN = LOW }")?;
    let mut interpreter = Interpreter::new(&program, device.clone(), sensors);

    let report = run_pass(&mut interpreter);
    assert!(report.faults.is_empty());
    assert!(device.commands().is_empty());
    Ok(())
}

#[test]
fn test_while_loop_counts() -> Result<()> {
    let (program, device, sensors) = setup(
        r#"
        SET i = 0
        WHILE i LT 3 {
            SET i = i + 1
            SET TEMP = 20 + i
        }
        "#,
    )?;
    let mut interpreter = Interpreter::new(&program, device.clone(), sensors);

    run_pass(&mut interpreter);
    assert_eq!(
        device.commands(),
        vec![Command::Temp(21), Command::Temp(22), Command::Temp(23)]
    );
    assert_eq!(interpreter.environment().get("i"), Some(&Value::Integer(3)));
    Ok(())
}

#[test]
fn test_if_else_chain() -> Result<()> {
    let (program, device, sensors) = setup(
        r#"
        IF TIME LT 21600 {
            SET MODE = HEAT
        } ELSE IF TIME LT 64800 {
            SET MODE = COOL
        } ELSE {
            SET MODE = AUTO
        }
        "#,
    )?;
    sensors.set(Sensor::Time, 70_000);
    let mut interpreter = Interpreter::new(&program, device.clone(), sensors.clone());
    run_pass(&mut interpreter);

    sensors.set(Sensor::Time, 3_600);
    run_pass(&mut interpreter);

    assert_eq!(device.commands(), vec![Command::Mode(Mode::Auto), Command::Mode(Mode::Heat)]);
    Ok(())
}

#[test]
fn test_wait_suspends_and_resumes() -> Result<()> {
    let (program, device, sensors) = setup(
        r#"
        RULE pulse: 1 {
            SET FAN = LOW
            WAIT 5 SECONDS
            SET FAN = HIGH
        }
        RULE after: 1 { SET POWER = ON }
        "#,
    )?;
    let mut interpreter = Interpreter::new(&program, device.clone(), sensors);

    assert_eq!(interpreter.step(), Step::Suspended(Duration::from_secs(5)));
    assert!(interpreter.is_suspended());
    assert_eq!(device.commands(), vec![Command::Fan(FanSpeed::Low)]);

    match interpreter.step() {
        Step::PassComplete(report) => {
            assert_eq!(report.fired, vec!["pulse".to_string(), "after".to_string()]);
        }
        other => panic!("expected pass to complete, got {:?}", other),
    }
    assert!(!interpreter.is_suspended());
    assert_eq!(
        device.commands(),
        vec![
            Command::Fan(FanSpeed::Low),
            Command::Fan(FanSpeed::High),
            Command::Power(Power::On),
        ]
    );
    Ok(())
}

#[test]
fn test_wait_inside_loop_resumes_mid_loop() -> Result<()> {
    let (program, device, sensors) = setup("REPEAT 2 { SET FAN = LOW  WAIT 1 SECONDS }")?;
    let mut interpreter = Interpreter::new(&program, device.clone(), sensors);

    assert_eq!(interpreter.step(), Step::Suspended(Duration::from_secs(1)));
    assert_eq!(interpreter.step(), Step::Suspended(Duration::from_secs(1)));
    assert!(matches!(interpreter.step(), Step::PassComplete(_)));
    assert_eq!(device.commands().len(), 2);
    Ok(())
}

#[test]
fn test_wait_zero_still_yields() -> Result<()> {
    let (program, device, sensors) = setup("WAIT 0 SECONDS")?;
    let mut interpreter = Interpreter::new(&program, device, sensors);

    assert_eq!(interpreter.step(), Step::Suspended(Duration::ZERO));
    assert!(matches!(interpreter.step(), Step::PassComplete(_)));
    Ok(())
}

#[test]
fn test_invalid_wait_faults() -> Result<()> {
    let (program, device, sensors) = setup(r#"WAIT "soon" SECONDS  WAIT -3 SECONDS"#)?;
    let mut interpreter = Interpreter::new(&program, device, sensors);

    let report = run_pass(&mut interpreter);
    assert_eq!(report.faults.len(), 2);
    assert!(report.faults.iter().all(|f| matches!(f.error, RuntimeError::InvalidWait { .. })));
    Ok(())
}

#[test]
fn test_edge_trigger_fires_on_rising_edge_only() -> Result<()> {
    let (program, device, sensors) = setup("RULE HUMIDITY GT 60 { SET MODE = DRY }")?;
    let mut interpreter = Interpreter::new(&program, device.clone(), sensors.clone())
        .with_trigger_mode(TriggerMode::Edge);

    let fired: Vec<usize> = [70, 75, 50, 65]
        .into_iter()
        .map(|humidity| {
            sensors.set(Sensor::Humidity, humidity);
            run_pass(&mut interpreter).fired.len()
        })
        .collect();

    assert_eq!(fired, vec![1, 0, 0, 1]);
    assert_eq!(device.commands().len(), 2);
    Ok(())
}

#[test]
fn test_edge_state_survives_condition_errors() -> Result<()> {
    let (program, device, sensors) = setup("RULE HUMIDITY GT 60 { SET MODE = DRY }")?;
    let mut interpreter = Interpreter::new(&program, device.clone(), sensors.clone())
        .with_trigger_mode(TriggerMode::Edge);

    sensors.set(Sensor::Humidity, 70);
    run_pass(&mut interpreter);

    sensors.set(Sensor::Humidity, 500);
    assert_eq!(run_pass(&mut interpreter).faults.len(), 1);

    sensors.set(Sensor::Humidity, 70);
    assert!(run_pass(&mut interpreter).fired.is_empty());
    assert_eq!(device.commands().len(), 1);
    Ok(())
}

#[test]
fn test_step_limit_aborts_runaway_loop() -> Result<()> {
    let (program, device, sensors) = setup(
        r#"
        RULE spin: 1 { WHILE 1 { SET x = 1 } }
        RULE next: 1 { SET FAN = AUTO }
        "#,
    )?;
    let mut interpreter = Interpreter::new(&program, device.clone(), sensors).with_max_steps(100);

    let report = run_pass(&mut interpreter);
    assert_eq!(report.faults.len(), 1);
    assert_eq!(report.faults[0].rule, "spin");
    assert!(matches!(report.faults[0].error, RuntimeError::StepLimit { limit: 100, .. }));
    assert_eq!(device.commands(), vec![Command::Fan(FanSpeed::Auto)]);
    Ok(())
}

#[test]
fn test_step_limit_resets_after_wait() -> Result<()> {
    let (program, device, sensors) = setup("REPEAT 4 { SET a = 1  SET b = 2  WAIT 1 SECONDS }")?;
    let mut interpreter = Interpreter::new(&program, device, sensors).with_max_steps(5);

    let mut suspensions = 0;
    let report = loop {
        match interpreter.step() {
            Step::Suspended(_) => suspensions += 1,
            Step::PassComplete(report) => break report,
        }
    };
    assert_eq!(suspensions, 4);
    assert!(report.faults.is_empty());
    Ok(())
}

#[test]
fn test_fault_aborts_only_the_failing_rule() -> Result<()> {
    let (program, device, sensors) = setup(
        r#"
        SET TEMP = 5 / 0
        SET FAN = HIGH
        "#,
    )?;
    let mut interpreter = Interpreter::new(&program, device.clone(), sensors);

    let report = run_pass(&mut interpreter);
    assert_eq!(report.faults.len(), 1);
    let fault = &report.faults[0];
    assert_eq!((fault.pass, fault.index, fault.rule.as_str()), (1, 0, "#0"));
    assert!(matches!(
        fault.error,
        RuntimeError::Eval(EvalError::DivisionByZero { .. })
    ));
    assert_eq!(device.commands(), vec![Command::Fan(FanSpeed::High)]);
    Ok(())
}

#[test]
fn test_text_condition_is_a_type_mismatch() -> Result<()> {
    let (program, device, sensors) = setup(r#"RULE "yes" { SET POWER = ON }"#)?;
    let mut interpreter = Interpreter::new(&program, device.clone(), sensors);

    let report = run_pass(&mut interpreter);
    assert!(matches!(
        report.faults[0].error,
        RuntimeError::Eval(EvalError::TypeMismatch { .. })
    ));
    assert!(device.commands().is_empty());
    Ok(())
}

#[test]
fn test_fault_history_is_bounded() -> Result<()> {
    let (program, device, sensors) = setup("SET TEMP = missing")?;
    let config = Config::default().with_fault_history(2);
    let mut interpreter = Interpreter::new(&program, device, sensors).with_config(&config);

    for _ in 0..5 {
        run_pass(&mut interpreter);
    }
    let passes: Vec<u64> = interpreter.faults().map(|f| f.pass).collect();
    assert_eq!(passes, vec![4, 5]);
    Ok(())
}

#[test]
fn test_rejected_command_leaves_state_untouched() -> Result<()> {
    let program = parse_source("SET TEMP = 40  SET TEMP = 26")?;
    let device = RecordingDevice::rejecting_temp_above(30);
    let mut interpreter = Interpreter::new(&program, device.clone(), FixedSensors::new());

    let report = run_pass(&mut interpreter);
    assert_eq!(report.faults.len(), 1);
    match &report.faults[0].error {
        RuntimeError::Device { command, .. } => assert_eq!(*command, Command::Temp(40)),
        other => panic!("expected device error, got {:?}", other),
    }
    assert_eq!(device.commands(), vec![Command::Temp(26)]);
    assert_eq!(interpreter.state().setpoint, 26);
    Ok(())
}

#[test]
fn test_empty_program_completes_passes() -> Result<()> {
    let (program, device, sensors) = setup("")?;
    let mut interpreter = Interpreter::new(&program, device, sensors);

    assert_eq!(run_pass(&mut interpreter).pass, 1);
    assert_eq!(run_pass(&mut interpreter).pass, 2);
    assert_eq!(interpreter.pass(), 3);
    Ok(())
}
