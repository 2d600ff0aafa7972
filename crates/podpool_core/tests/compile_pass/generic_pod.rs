use podpool_core::prelude::*;

#[derive(Entries)]
struct Holder<V>
where
    V: Clone + Send + Sync + 'static,
{
    #[pod(import)]
    pub input: Import<V>,
    #[pod(export = "held")]
    pub output: Export<V>,
}

impl<V> Pod for Holder<V> where V: Clone + Send + Sync + 'static {}

fn main() {
    let mut pool = PodPool::new();
    pool.register(Holder::<u8> {
        input: Import::new(),
        output: Export::new(),
    })
    .unwrap();
    assert_eq!(Holder::<String>::entries().len(), 2);
}
