use gpu_staging::{
    config::StagingConfig,
    graphics::{
        backend::SimDevice,
        commands::{FrameRing, SubmitQueue, Transfer},
        fence::Fence,
        resources::{DeviceBuffer, UploadRing},
        types::{BufferUsage, ResourceId},
    },
};
use rand::Rng;
use tracing::info;

fn main() {
    tracing_subscriber::fmt().init();

    let config = StagingConfig {
        upload_capacity: 4 * 1024 * 1024,
        ..Default::default()
    };
    config.validate().unwrap();

    let device = SimDevice::new();
    let fence = Fence::new(config.wait_timeout);
    let queue = SubmitQueue::<Transfer, _>::new(device.clone(), fence.clone());
    let mut ring = UploadRing::new(&config, fence.clone()).unwrap();
    let mut frames = FrameRing::new(&config, fence).unwrap();

    let vertices = DeviceBuffer::new(
        ResourceId::new(1),
        1 << 20,
        BufferUsage::COPY_DST | BufferUsage::VERTEX,
    );
    let mut rng = rand::thread_rng();

    for frame in 0..8u32 {
        let ctx = frames.acquire().unwrap();

        let mesh: Vec<u8> = (0..rng.gen_range(1024..4096)).map(|_| rng.gen()).collect();
        let offset = ring
            .upload_and_copy(ctx.batch_mut(), &vertices, 0, &mesh, 16)
            .unwrap();

        let batch = ctx.take_batch();
        let value = queue.submit(batch);
        frames.mark_submitted(value);

        info!(frame, offset, bytes = mesh.len(), value, "frame submitted");

        // the simulated device trails the producer by one frame
        if frame > 0 {
            device.complete_one();
        }
        ring.reclaim_completed();
    }

    device.complete_all();
    queue.wait_for_latest().unwrap();
    frames.drain().unwrap();
    ring.drain().unwrap();

    info!(
        in_use = ring.in_use_bytes(),
        batches = device.executed_batches(),
        "shutdown complete"
    );
}
