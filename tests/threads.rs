use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use rosen_surface::{
    BufferFlushConfig, BufferRequestConfig, ChannelConsumerListener, ConsumerEvent,
    ConsumerSurface, GsError, ProducerSurface, Surface, SurfaceBuffer, SyncFence,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn channel_pair(
    queue_size: u32,
) -> (
    ConsumerSurface,
    ProducerSurface,
    crossbeam_channel::Receiver<ConsumerEvent>,
) {
    init_tracing();
    let consumer = ConsumerSurface::create("threads");
    consumer.set_queue_size(queue_size).unwrap();
    let (listener, rx) = ChannelConsumerListener::new();
    consumer.register_consumer_listener(listener).unwrap();
    let producer = ProducerSurface::create(consumer.producer());
    (consumer, producer, rx)
}

fn with_timeout(timeout: i32) -> BufferRequestConfig {
    BufferRequestConfig {
        timeout,
        ..BufferRequestConfig::new(16, 16)
    }
}

#[test]
fn full_queue_fails_fast_without_timeout() {
    let (_consumer, producer, _rx) = channel_pair(1);
    let _held = producer.request_buffer(&with_timeout(0)).unwrap();

    let started = Instant::now();
    assert_eq!(
        producer.request_buffer(&with_timeout(30)).unwrap_err(),
        GsError::NoBuffer
    );
    assert!(started.elapsed() >= Duration::from_millis(30));
    assert_eq!(
        producer.request_buffer(&with_timeout(0)).unwrap_err(),
        GsError::NoBuffer
    );
}

#[test]
fn blocked_request_wakes_on_cancel() {
    let (_consumer, producer, _rx) = channel_pair(1);
    let held = producer.request_buffer(&with_timeout(0)).unwrap();

    thread::scope(|scope| {
        scope.spawn(|| {
            thread::sleep(Duration::from_millis(50));
            producer.cancel_buffer(&held.buffer).unwrap();
        });
        let requested = producer.request_buffer(&with_timeout(5_000)).unwrap();
        assert_eq!(requested.buffer.sequence(), held.buffer.sequence());
    });
}

#[test]
fn blocked_request_wakes_on_release() {
    let (consumer, producer, rx) = channel_pair(1);
    let released = Arc::new(AtomicUsize::new(0));
    let counter = released.clone();
    producer
        .register_release_listener(Arc::new(move |_buffer: &Arc<SurfaceBuffer>| {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();

    let first = producer.request_buffer(&with_timeout(0)).unwrap();
    producer
        .flush_buffer(&first.buffer, SyncFence::INVALID, &BufferFlushConfig::default())
        .unwrap();

    thread::scope(|scope| {
        scope.spawn(|| {
            assert_eq!(
                rx.recv_timeout(Duration::from_secs(5)),
                Ok(ConsumerEvent::BufferAvailable)
            );
            thread::sleep(Duration::from_millis(20));
            let acquired = consumer.acquire_buffer().unwrap();
            consumer
                .release_buffer(&acquired.buffer, SyncFence::new(4))
                .unwrap();
        });
        let requested = producer.request_buffer(&with_timeout(5_000)).unwrap();
        assert_eq!(requested.fence, SyncFence::new(4));
    });
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn frames_cross_threads_in_flush_order() {
    const FRAMES: u8 = 40;
    let (consumer, producer, rx) = channel_pair(3);

    thread::scope(|scope| {
        scope.spawn(|| {
            for frame in 0..FRAMES {
                let requested = producer.request_buffer(&with_timeout(5_000)).unwrap();
                requested.buffer.write_pixels(|pixels| pixels[0] = frame);
                producer
                    .flush_buffer(&requested.buffer, SyncFence::INVALID, &BufferFlushConfig::default())
                    .unwrap();
            }
        });

        let mut seen = Vec::with_capacity(usize::from(FRAMES));
        while seen.len() < usize::from(FRAMES) {
            match rx.recv_timeout(Duration::from_secs(5)) {
                Ok(ConsumerEvent::BufferAvailable) => {}
                Ok(_) => continue,
                Err(err) => panic!("no frame within timeout: {err}"),
            }
            let acquired = consumer.acquire_buffer().unwrap();
            seen.push(acquired.buffer.read_pixels(|pixels| pixels[0]));
            consumer
                .release_buffer(&acquired.buffer, SyncFence::INVALID)
                .unwrap();
        }
        assert_eq!(seen, (0..FRAMES).collect::<Vec<_>>());
    });
}

#[test]
fn listener_may_call_back_into_the_queue() {
    use rosen_surface::ConsumerListener;

    struct AutoRelease {
        consumer: Arc<ConsumerSurface>,
        handled: AtomicUsize,
    }

    impl ConsumerListener for AutoRelease {
        fn on_buffer_available(&self) {
            let acquired = self.consumer.acquire_buffer().unwrap();
            self.consumer
                .release_buffer(&acquired.buffer, SyncFence::INVALID)
                .unwrap();
            self.handled.fetch_add(1, Ordering::SeqCst);
        }
    }

    let consumer = Arc::new(ConsumerSurface::create("reentrant"));
    let listener = Arc::new(AutoRelease {
        consumer: consumer.clone(),
        handled: AtomicUsize::new(0),
    });
    consumer.register_consumer_listener(listener.clone()).unwrap();
    let producer = ProducerSurface::create(consumer.producer());

    for _ in 0..5 {
        let requested = producer.request_buffer(&with_timeout(0)).unwrap();
        producer
            .flush_buffer(&requested.buffer, SyncFence::INVALID, &BufferFlushConfig::default())
            .unwrap();
    }
    assert_eq!(listener.handled.load(Ordering::SeqCst), 5);

    // Break the listener -> surface cycle.
    consumer.unregister_consumer_listener().unwrap();
}
