//! Tests for the run module.

use super::*;

use std::time::Duration;

use regulate::config::Cli;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

fn config(args: &[&str]) -> ValidatedConfig {
    let mut full_args = vec!["regulate"];
    full_args.extend(args);
    ValidatedConfig::from_raw(&Cli::parse_from_iter(full_args), None).unwrap()
}

fn ready_lines(lines: &[&str]) -> impl Stream<Item = io::Result<String>> + use<> {
    let lines: Vec<io::Result<String>> = lines.iter().map(|l| Ok((*l).to_string())).collect();
    tokio_stream::iter(lines)
}

mod run_error {
    use super::*;

    #[test]
    fn input_error_displays_source() {
        let error = RunError::Input(io::Error::other("pipe closed"));
        assert_eq!(error.to_string(), "Failed to read input: pipe closed");
    }

    #[test]
    fn debug_format_works() {
        let error = RunError::Input(io::Error::other("boom"));
        let debug_str = format!("{error:?}");
        assert!(debug_str.contains("Input"));
    }
}

mod regulator_selection {
    use super::*;
    use std::sync::Mutex;

    fn collect(regulator: &dyn Regulator<u32>) -> Arc<Mutex<Vec<u32>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        regulator.set_output(Some(regulate::regulator::output(move |value| {
            sink.lock().unwrap().push(value);
            std::future::ready(())
        })));
        seen
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_mode_builds_a_debouncer() {
        let config = config(&["--mode", "debounce", "--due-time", "100"]);
        let regulator = build_regulator::<u32>(&config);
        let seen = collect(regulator.as_ref());

        regulator.push(1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        regulator.push(2);
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(regulator.due_time(), Duration::from_millis(100));
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_mode_honours_first_flag() {
        let config = config(&["--mode", "throttle", "--due-time", "100", "--first"]);
        let regulator = build_regulator::<u32>(&config);
        let seen = collect(regulator.as_ref());

        regulator.push(1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        regulator.push(2);
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }
}

mod run_lines {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_is_debounced_into_one_emission() {
        let config = config(&["--due-time", "100"]);
        let lines = ready_lines(&["a", "b", "c"]);

        let summary = run_lines(&config, lines, std::future::pending())
            .await
            .unwrap();

        assert_eq!(
            summary,
            RunSummary {
                lines: 3,
                emitted: 1,
                triggers: 0,
                fired: 0,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_lines_fire_the_trigger_only() {
        let config = config(&["--due-time", "100", "--trigger", "go"]);
        let lines = ready_lines(&["text", "go", " go ", "go"]);

        let summary = run_lines(&config, lines, std::future::pending())
            .await
            .unwrap();

        assert_eq!(summary.lines, 1);
        assert_eq!(summary.triggers, 3);
        assert_eq!(summary.fired, 1);
        assert_eq!(summary.emitted, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_lines_are_throttled_per_window() {
        let config = config(&["--mode", "throttle", "--due-time", "100"]);
        let (tx, rx) = mpsc::unbounded_channel();

        let producer = tokio::spawn(async move {
            // Lines at 0, 30, ..., 270: windows close at 100, 200 and 300.
            for i in 0..10 {
                tx.send(Ok(format!("line {i}"))).unwrap();
                tokio::time::sleep(Duration::from_millis(30)).await;
            }
        });

        let summary = run_lines(&config, UnboundedReceiverStream::new(rx), std::future::pending())
            .await
            .unwrap();
        producer.await.unwrap();

        assert_eq!(summary.lines, 10);
        assert_eq!(summary.emitted, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn read_error_is_returned() {
        let config = config(&[]);
        let lines = tokio_stream::iter(vec![
            Ok("a".to_string()),
            Err(io::Error::other("broken pipe")),
        ]);

        let result = run_lines(&config, lines, std::future::pending()).await;

        assert!(matches!(result, Err(RunError::Input(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_immediately_and_drops_pending_output() {
        let config = config(&["--due-time", "100"]);
        let (tx, rx) = mpsc::unbounded_channel::<io::Result<String>>();
        tx.send(Ok("pending".to_string())).unwrap();

        let shutdown = tokio::time::sleep(Duration::from_millis(50));
        let began = tokio::time::Instant::now();
        let summary = run_lines(&config, UnboundedReceiverStream::new(rx), shutdown)
            .await
            .unwrap();

        assert_eq!(summary.lines, 1);
        assert_eq!(summary.emitted, 0);
        assert!(began.elapsed() < Duration::from_millis(100));
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_two_due_times_after_input_closes() {
        let config = config(&["--due-time", "100"]);
        let began = tokio::time::Instant::now();

        run_lines(&config, ready_lines(&["x"]), std::future::pending())
            .await
            .unwrap();

        assert!(began.elapsed() >= Duration::from_millis(200));
    }
}
