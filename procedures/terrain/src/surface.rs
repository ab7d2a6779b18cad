/// Blend weights produced by one shader for one segment.
///
/// Weights are in `[0, 1]`, interleaved per grid point: the weight of
/// `channel` at `(x, z)` lives at `(z * size + x) * channels + channel`.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
	size: usize,
	channels: usize,
	data: Vec<f32>,
}

impl Surface {
	pub fn new(size: usize, channels: usize) -> Self {
		Self { size, channels, data: vec![0.0; size * size * channels] }
	}

	pub fn size(&self) -> usize {
		self.size
	}

	pub fn channels(&self) -> usize {
		self.channels
	}

	pub fn data(&self) -> &[f32] {
		&self.data
	}

	pub fn data_mut(&mut self) -> &mut [f32] {
		&mut self.data
	}

	/// Raw bytes of the weight buffer, for upload by a renderer.
	pub fn as_bytes(&self) -> &[u8] {
		bytemuck::cast_slice(&self.data)
	}

	fn index(&self, x: usize, z: usize, channel: usize) -> usize {
		debug_assert!(x < self.size && z < self.size && channel < self.channels);
		(z * self.size + x) * self.channels + channel
	}

	pub fn get(&self, x: usize, z: usize, channel: usize) -> f32 {
		self.data[self.index(x, z, channel)]
	}

	pub fn set(&mut self, x: usize, z: usize, channel: usize, weight: f32) {
		let i = self.index(x, z, channel);
		self.data[i] = weight;
	}

	pub fn fill(&mut self, weight: f32) {
		self.data.fill(weight);
	}

	/// Weights of one channel in grid order.
	pub fn channel(&self, channel: usize) -> impl Iterator<Item = f32> + '_ {
		assert!(channel < self.channels, "channel {channel} out of {}", self.channels);
		self.data.iter().skip(channel).step_by(self.channels).copied()
	}

	/// Average weight of a channel over the whole grid.
	pub fn coverage(&self, channel: usize) -> f32 {
		self.channel(channel).sum::<f32>() / (self.size * self.size) as f32
	}
}
