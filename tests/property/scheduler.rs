// tests/property/scheduler.rs

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use proptest::prelude::*;
use rundag::config::ConfigFile;
use rundag::dag::TaskState;
use rundag::engine::{CoreRuntime, FailureCause, RunEvent, RunOptions, TaskOutcome};
use rundag_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

// Strategy to generate a valid DAG configuration.
// Acyclic because task N may only depend on tasks 0..N-1.
fn dag_config_strategy(max_tasks: usize) -> impl Strategy<Value = ConfigFile> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let deps_strat = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        );

        deps_strat.prop_map(move |raw_deps| {
            let mut builder = ConfigFileBuilder::new();
            for (i, potential_deps) in raw_deps.into_iter().enumerate() {
                let name = format!("task_{i:02}");
                let mut task_builder = TaskConfigBuilder::new();

                let valid_deps: BTreeSet<usize> = if i == 0 {
                    BTreeSet::new()
                } else {
                    potential_deps.into_iter().map(|d| d % i).collect()
                };
                for dep_idx in valid_deps {
                    task_builder = task_builder.after(&format!("task_{dep_idx:02}"));
                }
                builder = builder.with_task(&name, task_builder.build());
            }
            builder.build()
        })
    })
}

proptest! {
    #[test]
    fn every_task_reaches_a_terminal_state(
        cfg in dag_config_strategy(12),
        failing_indices in proptest::collection::vec(0..12usize, 0..4),
        picks in proptest::collection::vec(any::<usize>(), 64),
        max_parallel in proptest::option::of(1..4usize),
    ) {
        let graph = cfg.graph().unwrap();
        let task_names: Vec<String> = graph.task_ids().map(str::to_string).collect();
        let failing: HashSet<String> = failing_indices
            .iter()
            .filter(|&&i| i < task_names.len())
            .map(|&i| task_names[i].clone())
            .collect();

        let options = RunOptions { max_parallel, timeout: None };
        let mut core = CoreRuntime::new(&graph, options).unwrap();

        let mut events: Vec<RunEvent> = Vec::new();
        let mut executing: Vec<String> = Vec::new();

        let step = core.start();
        executing.extend(step.dispatch.iter().map(|n| n.id().to_string()));
        events.extend(step.events);

        let mut steps = 0;
        while !executing.is_empty() {
            steps += 1;
            prop_assert!(steps <= task_names.len(), "more completions than tasks");
            if let Some(limit) = max_parallel {
                prop_assert!(executing.len() <= limit);
            }

            // Complete an arbitrary running task.
            let pick = picks[steps % picks.len()] % executing.len();
            let task = executing.swap_remove(pick);
            let outcome = if failing.contains(&task) {
                TaskOutcome::Failed("scripted".to_string())
            } else {
                TaskOutcome::Success
            };

            let step = core.on_completion(&task, outcome);
            executing.extend(step.dispatch.iter().map(|n| n.id().to_string()));
            events.extend(step.events);
        }

        prop_assert!(!core.has_outstanding());
        prop_assert_eq!(core.queued_len(), 0);
        prop_assert!(core.state().all_tasks_terminal());

        // Dispatch order respects dependencies and nothing runs twice.
        let mut completed: HashSet<&str> = HashSet::new();
        let mut dispatched: HashSet<&str> = HashSet::new();
        for event in &events {
            match event {
                RunEvent::Completed { task } => { completed.insert(task.as_str()); }
                RunEvent::Dispatched { task } => {
                    prop_assert!(dispatched.insert(task.as_str()), "{} dispatched twice", task);
                    for dep in graph.node(task).unwrap().dependencies() {
                        prop_assert!(completed.contains(dep.as_str()));
                    }
                }
                RunEvent::Failed { .. } => {}
            }
        }

        let report = core.into_report(Duration::ZERO);
        prop_assert!(report.never_ran.is_empty());
        prop_assert_eq!(report.completed.len() + report.failed.len(), task_names.len());

        for task in &task_names {
            let node = graph.node(task).unwrap();
            match report.state_of(task) {
                // Completed tasks had every dependency complete and were not scripted to fail.
                Some(TaskState::Completed) => {
                    prop_assert!(!failing.contains(task));
                    for dep in node.dependencies() {
                        prop_assert!(report.completed.contains(dep));
                    }
                }
                Some(TaskState::Failed) => match report.failed.get(task) {
                    Some(FailureCause::Execution(_)) => prop_assert!(failing.contains(task)),
                    Some(FailureCause::UpstreamFailed(root)) => {
                        prop_assert!(report.execution_errors().iter().any(|e| &e.task == root));
                        prop_assert!(node.dependencies().iter().any(|d| report.failed.contains_key(d)));
                    }
                    other => prop_assert!(false, "unexpected cause {:?}", other),
                },
                other => prop_assert!(false, "task {} ended in {:?}", task, other),
            }
        }
    }

    #[test]
    fn topological_order_lists_dependencies_first(cfg in dag_config_strategy(15)) {
        let graph = cfg.graph().unwrap();
        let order = graph.topological_order().unwrap();
        prop_assert_eq!(order.len(), graph.len());

        for (pos, task) in order.iter().enumerate() {
            for dep in graph.node(task).unwrap().dependencies() {
                let dep_pos = order.iter().position(|t| t == dep).unwrap();
                prop_assert!(dep_pos < pos, "{} listed after {}", dep, task);
            }
        }
    }
}
