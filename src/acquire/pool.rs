use std::collections::VecDeque;
use std::sync::mpsc::channel;
use std::sync::{Arc, Mutex};

use crate::manifest::DownloadTask;

use super::AcquireProgress;
use super::progress::progress_tick;
use super::task::TaskOutcome;

/// How download tasks are scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Dispatch {
    /// One task at a time on the calling thread, in task order.
    Sequential,
    /// A fixed number of scoped worker threads draining a shared queue.
    Parallel { workers: usize },
}

/// Run `work` over every task and return the outcomes in completion order.
///
/// Progress is always reported from the calling thread.
pub(super) fn run_tasks<F>(
    tasks: &[DownloadTask],
    dispatch: Dispatch,
    work: F,
    progress: &mut Option<&mut dyn FnMut(AcquireProgress)>,
) -> Vec<TaskOutcome>
where
    F: Fn(&DownloadTask) -> TaskOutcome + Sync,
{
    let total = tasks.len();
    let mut outcomes = Vec::with_capacity(total);
    match dispatch {
        Dispatch::Sequential => {
            for task in tasks {
                outcomes.push(work(task));
                progress_tick(progress, outcomes.len(), total);
            }
        }
        Dispatch::Parallel { workers } => {
            let worker_count = workers.min(total).max(1);
            let queue = Arc::new(Mutex::new(tasks.iter().collect::<VecDeque<_>>()));
            let (tx, rx) = channel();
            let work = &work;
            std::thread::scope(|scope| {
                for _ in 0..worker_count {
                    let queue = Arc::clone(&queue);
                    let tx = tx.clone();
                    scope.spawn(move || {
                        loop {
                            let next = {
                                let mut guard = match queue.lock() {
                                    Ok(guard) => guard,
                                    Err(_) => return,
                                };
                                guard.pop_front()
                            };
                            let Some(task) = next else {
                                break;
                            };
                            if tx.send(work(task)).is_err() {
                                break;
                            }
                        }
                    });
                }
                drop(tx);
                for outcome in rx {
                    outcomes.push(outcome);
                    progress_tick(progress, outcomes.len(), total);
                }
            });
        }
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::thread::ThreadId;

    fn tasks(count: usize) -> Vec<DownloadTask> {
        (0..count)
            .map(|index| DownloadTask {
                index,
                group_id: "g".to_string(),
                entity_name: "e".to_string(),
                image_link: format!("http://x/{index}.jpg"),
            })
            .collect()
    }

    #[test]
    fn sequential_runs_in_task_order() {
        let tasks = tasks(5);
        let seen = Mutex::new(Vec::new());
        let outcomes = run_tasks(
            &tasks,
            Dispatch::Sequential,
            |task| {
                seen.lock().unwrap().push(task.index);
                TaskOutcome::Downloaded
            },
            &mut None,
        );
        assert_eq!(outcomes.len(), 5);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn parallel_runs_every_task_once_and_reports_progress() {
        let tasks = tasks(40);
        let seen = Mutex::new(Vec::new());
        let threads = Mutex::new(HashSet::<ThreadId>::new());
        let mut ticks = Vec::new();
        let mut on_progress = |update: AcquireProgress| ticks.push(update);
        let mut progress: Option<&mut dyn FnMut(AcquireProgress)> = Some(&mut on_progress);
        let outcomes = run_tasks(
            &tasks,
            Dispatch::Parallel { workers: 4 },
            |task| {
                seen.lock().unwrap().push(task.index);
                threads.lock().unwrap().insert(std::thread::current().id());
                TaskOutcome::Skipped
            },
            &mut progress,
        );
        assert_eq!(outcomes.len(), 40);
        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, (0..40).collect::<Vec<_>>());
        assert!(threads.into_inner().unwrap().len() <= 4);
        assert_eq!(ticks.len(), 40);
        assert_eq!(ticks.last().map(|t| (t.processed, t.total)), Some((40, 40)));
    }

    #[test]
    fn parallel_with_no_tasks_returns_immediately() {
        let outcomes = run_tasks(
            &[],
            Dispatch::Parallel { workers: 8 },
            |_| TaskOutcome::Downloaded,
            &mut None,
        );
        assert!(outcomes.is_empty());
    }
}
