// Copyright 2025 Irreducible Inc.

use std::sync::mpsc;

use pollster::FutureExt;
use tracing::{debug, info};
use wgpu::util::DeviceExt;

use crate::{
	config::KERNEL_ENTRY_POINT,
	device::{select_device, DeviceCandidate, DeviceInfo},
	error::Error,
};

/// Uniform block of the kernel. Mirrors `Params` in `kernels/relu.wgsl`.
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct KernelParams {
	len: u32,
	row_stride: u32,
	_pad: [u32; 2],
}

/// Objects produced by compiling the kernel source. Fields drop top to bottom, which is the
/// reverse of the order they are created in.
struct KernelProgram {
	pipeline: wgpu::ComputePipeline,
	_pipeline_layout: wgpu::PipelineLayout,
	bind_group_layout: wgpu::BindGroupLayout,
	_module: wgpu::ShaderModule,
	workgroup_size: u32,
}

/// Device-side buffers of one run, in the same reverse-creation field order.
struct DeviceBuffers {
	bind_group: wgpu::BindGroup,
	staging: wgpu::Buffer,
	_params: wgpu::Buffer,
	storage: wgpu::Buffer,
	len: usize,
	workgroups: (u32, u32),
}

impl DeviceBuffers {
	fn release(self) {
		let Self {
			bind_group,
			staging,
			_params: params,
			storage,
			..
		} = self;
		drop(bind_group);
		staging.destroy();
		params.destroy();
		storage.destroy();
	}
}

/// Every native handle of one offload run.
///
/// Handles are acquired step by step (device, then program, then buffers) and the scope owns
/// each of them as soon as it exists. Dropping the scope releases whatever was acquired, newest
/// first, so an early return at any step leaks nothing.
pub struct DeviceScope {
	instance: Option<wgpu::Instance>,
	adapter: Option<wgpu::Adapter>,
	device: Option<wgpu::Device>,
	queue: Option<wgpu::Queue>,
	program: Option<KernelProgram>,
	buffers: Option<DeviceBuffers>,
	info: DeviceInfo,
}

impl DeviceScope {
	/// Selects a device and opens a context and command queue on it.
	pub fn acquire() -> Result<Self, Error> {
		let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
			backends: wgpu::Backends::all(),
			..Default::default()
		});

		let mut adapters = instance.enumerate_adapters(wgpu::Backends::all());
		let candidates: Vec<DeviceCandidate> = adapters
			.iter()
			.map(|adapter| DeviceCandidate::from(&adapter.get_info()))
			.collect();
		for candidate in &candidates {
			debug!(
				name = %candidate.name,
				class = ?candidate.class,
				platform = ?candidate.platform,
				"enumerated compute device"
			);
		}

		let index = select_device(&candidates).ok_or(Error::NoDevice)?;
		let adapter = adapters.swap_remove(index);
		drop(adapters);
		let info = DeviceInfo::from(candidates[index].clone());
		info!(device = %info, "selected compute device");

		let (device, queue) = adapter
			.request_device(
				&wgpu::DeviceDescriptor {
					label: Some("relu device"),
					required_features: wgpu::Features::empty(),
					required_limits: adapter.limits(),
					memory_hints: wgpu::MemoryHints::Performance,
				},
				None,
			)
			.block_on()?;
		device.on_uncaptured_error(Box::new(|err| {
			tracing::error!(%err, "uncaptured device error");
		}));

		Ok(Self {
			instance: Some(instance),
			adapter: Some(adapter),
			device: Some(device),
			queue: Some(queue),
			program: None,
			buffers: None,
			info,
		})
	}

	pub fn info(&self) -> &DeviceInfo {
		&self.info
	}

	fn device(&self) -> &wgpu::Device {
		self.device
			.as_ref()
			.expect("device is present until the scope drops")
	}

	fn queue(&self) -> &wgpu::Queue {
		self.queue
			.as_ref()
			.expect("queue is present until the scope drops")
	}

	/// Compiles `source` with `WORKGROUP_SIZE` bound to `workgroup_size`.
	///
	/// On failure the returned error carries the full compiler log.
	pub(crate) fn compile(&mut self, source: &str, workgroup_size: u32) -> Result<(), Error> {
		let device = self.device();
		let source = format!("const WORKGROUP_SIZE: u32 = {workgroup_size}u;\n{source}");

		device.push_error_scope(wgpu::ErrorFilter::Validation);
		let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
			label: Some("relu kernel"),
			source: wgpu::ShaderSource::Wgsl(source.into()),
		});
		if let Some(err) = device.pop_error_scope().block_on() {
			let compilation_info = module.get_compilation_info().block_on();
			return Err(Error::KernelCompilation {
				log: build_log(&compilation_info, &err),
			});
		}

		let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
			label: Some("relu bind group layout"),
			entries: &[
				wgpu::BindGroupLayoutEntry {
					binding: 0,
					visibility: wgpu::ShaderStages::COMPUTE,
					ty: wgpu::BindingType::Buffer {
						ty: wgpu::BufferBindingType::Storage { read_only: false },
						has_dynamic_offset: false,
						min_binding_size: None,
					},
					count: None,
				},
				wgpu::BindGroupLayoutEntry {
					binding: 1,
					visibility: wgpu::ShaderStages::COMPUTE,
					ty: wgpu::BindingType::Buffer {
						ty: wgpu::BufferBindingType::Uniform,
						has_dynamic_offset: false,
						min_binding_size: None,
					},
					count: None,
				},
			],
		});
		let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
			label: Some("relu pipeline layout"),
			bind_group_layouts: &[&bind_group_layout],
			push_constant_ranges: &[],
		});

		device.push_error_scope(wgpu::ErrorFilter::Validation);
		let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
			label: Some("relu pipeline"),
			layout: Some(&pipeline_layout),
			module: &module,
			entry_point: Some(KERNEL_ENTRY_POINT),
			compilation_options: Default::default(),
			cache: None,
		});
		if let Some(err) = device.pop_error_scope().block_on() {
			return Err(Error::KernelCompilation {
				log: err.to_string(),
			});
		}
		debug!(workgroup_size, "compiled relu kernel");

		self.program = Some(KernelProgram {
			pipeline,
			_pipeline_layout: pipeline_layout,
			bind_group_layout,
			_module: module,
			workgroup_size,
		});
		Ok(())
	}

	/// Copies `data` into a fresh device buffer and binds it to the compiled kernel.
	pub(crate) fn upload(&mut self, data: &[i32]) -> Result<(), Error> {
		let device = self.device();
		let program = self
			.program
			.as_ref()
			.expect("upload is only called after a successful compile");
		let workgroup_size = program.workgroup_size;

		if data.is_empty() {
			return Err(Error::EmptyBuffer);
		}
		if data.len() % workgroup_size as usize != 0 {
			return Err(Error::WorkSizeMismatch {
				len: data.len(),
				workgroup_size,
			});
		}

		let limits = device.limits();
		let bytes = std::mem::size_of_val(data) as u64;
		let limit = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
		let len = u32::try_from(data.len())
			.ok()
			.filter(|_| bytes <= limit)
			.ok_or(Error::BufferTooLarge { bytes, limit })?;

		let workgroups = (len / workgroup_size) as u64;
		let max_per_dimension = u64::from(limits.max_compute_workgroups_per_dimension);
		let groups_x = workgroups.min(max_per_dimension);
		let groups_y = workgroups.div_ceil(groups_x);
		if groups_y > max_per_dimension {
			return Err(Error::TooManyWorkgroups { workgroups });
		}
		let params = KernelParams {
			len,
			row_stride: groups_x as u32 * workgroup_size,
			_pad: [0; 2],
		};

		let storage = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
			label: Some("relu data"),
			contents: bytemuck::cast_slice(data),
			usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
		});
		let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
			label: Some("relu params"),
			contents: bytemuck::bytes_of(&params),
			usage: wgpu::BufferUsages::UNIFORM,
		});
		let staging = device.create_buffer(&wgpu::BufferDescriptor {
			label: Some("relu readback"),
			size: bytes,
			usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
			mapped_at_creation: false,
		});
		let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
			label: Some("relu bind group"),
			layout: &program.bind_group_layout,
			entries: &[
				wgpu::BindGroupEntry {
					binding: 0,
					resource: storage.as_entire_binding(),
				},
				wgpu::BindGroupEntry {
					binding: 1,
					resource: params_buffer.as_entire_binding(),
				},
			],
		});
		debug!(len, groups_x, groups_y, "uploaded buffer");

		self.buffers = Some(DeviceBuffers {
			bind_group,
			staging,
			_params: params_buffer,
			storage,
			len: data.len(),
			workgroups: (groups_x as u32, groups_y as u32),
		});
		Ok(())
	}

	/// Runs the kernel over the uploaded buffer and waits for it to finish.
	pub(crate) fn execute(&self) -> Result<(), Error> {
		let device = self.device();
		let program = self
			.program
			.as_ref()
			.expect("execute is only called after a successful compile");
		let buffers = self
			.buffers
			.as_ref()
			.expect("execute is only called after a successful upload");

		device.push_error_scope(wgpu::ErrorFilter::Validation);
		let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
			label: Some("relu commands"),
		});
		{
			let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
				label: Some("relu pass"),
				timestamp_writes: None,
			});
			pass.set_pipeline(&program.pipeline);
			pass.set_bind_group(0, &buffers.bind_group, &[]);
			let (groups_x, groups_y) = buffers.workgroups;
			pass.dispatch_workgroups(groups_x, groups_y, 1);
		}
		encoder.copy_buffer_to_buffer(
			&buffers.storage,
			0,
			&buffers.staging,
			0,
			buffers.staging.size(),
		);
		self.queue().submit(Some(encoder.finish()));
		device.poll(wgpu::Maintain::Wait);

		if let Some(err) = device.pop_error_scope().block_on() {
			return Err(Error::Execution(err.to_string()));
		}
		Ok(())
	}

	/// Copies the device result into `data`, which must have the uploaded length. `data` is
	/// only written once the readback succeeded.
	pub(crate) fn read_back(&self, data: &mut [i32]) -> Result<(), Error> {
		let device = self.device();
		let buffers = self
			.buffers
			.as_ref()
			.expect("read_back is only called after a successful upload");
		assert_eq!(data.len(), buffers.len, "read_back length must match the upload");

		let slice = buffers.staging.slice(..);
		let (sender, receiver) = mpsc::channel();
		slice.map_async(wgpu::MapMode::Read, move |result| {
			let _ = sender.send(result);
		});
		device.poll(wgpu::Maintain::Wait);
		receiver
			.recv()
			.map_err(|_| Error::Execution("readback callback was dropped".to_string()))??;

		{
			let view = slice.get_mapped_range();
			bytemuck::cast_slice_mut::<i32, u8>(data).copy_from_slice(&view);
		}
		buffers.staging.unmap();
		Ok(())
	}
}

impl Drop for DeviceScope {
	fn drop(&mut self) {
		if let Some(buffers) = self.buffers.take() {
			buffers.release();
			debug!("released device buffers");
		}
		if self.program.take().is_some() {
			debug!("released kernel program");
		}
		if self.queue.take().is_some() {
			debug!("released command queue");
		}
		if let Some(device) = self.device.take() {
			device.destroy();
			debug!("released device context");
		}
		self.adapter.take();
		self.instance.take();
		debug!(device = %self.info, "released compute platform");
	}
}

fn build_log(info: &wgpu::CompilationInfo, err: &wgpu::Error) -> String {
	let mut log: Vec<String> = info
		.messages
		.iter()
		.map(|message| match &message.location {
			Some(location) => format!(
				"{}:{}: {:?}: {}",
				location.line_number, location.line_position, message.message_type, message.message
			),
			None => format!("{:?}: {}", message.message_type, message.message),
		})
		.collect();
	log.push(err.to_string());
	log.join("\n")
}
