#[mmg_queues::receiver]
struct OrderCreatedHandler;

#[mmg_queues::receiver("jobs.Runner")]
struct JobRunner;

fn main() {
    assert!(mmg_queues::receivers::is_registered("OrderCreatedHandler"));
    assert!(mmg_queues::receivers::is_registered("jobs.Runner"));
}
