#![cfg(test)]

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::component::{
    AttributeInfo, AttributeValue, Component, ComponentDescriptor, ComponentInfo, ConstructorArgs, FnComponentFactory,
    ReferenceInfo, ValueKind,
};
use crate::kernel::constants::CONFIGURATION_BASE_DIR;
use crate::kernel::error::{Error, Result};
use crate::kernel::Kernel;
use crate::naming::AbstractName;
use crate::repository::Artifact;

pub const RECORDER_TYPE: &str = "test.Recorder";

/// Shared record of lifecycle hooks, e.g. `start:a`, `stop:a`.
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// Test component: records its hooks, keeps a live `count` attribute and
/// fails its start hook when `fail` is set.
#[derive(Debug)]
pub struct Recorder {
    label: String,
    log: EventLog,
    count: AtomicI64,
    fail: AtomicBool,
    peers: Mutex<Vec<AbstractName>>,
}

impl Recorder {
    fn push(&self, event: &str) {
        self.log.lock().unwrap().push(format!("{}:{}", event, self.label));
    }
}

#[async_trait]
impl Component for Recorder {
    async fn do_start(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            self.push("fail-start");
            return Err(Error::other(format!("{} refuses to start", self.label)));
        }
        self.push("start");
        Ok(())
    }

    async fn do_stop(&self) -> Result<()> {
        self.push("stop");
        Ok(())
    }

    async fn do_fail(&self) {
        self.push("failed");
    }

    fn attribute(&self, name: &str) -> Option<AttributeValue> {
        match name {
            "count" => Some(AttributeValue::Int(self.count.load(Ordering::SeqCst))),
            _ => None,
        }
    }

    fn set_attribute(&self, name: &str, value: &AttributeValue) -> Result<()> {
        match name {
            "count" => self.count.store(value.as_int().unwrap_or(0), Ordering::SeqCst),
            "fail" => self.fail.store(value.as_bool().unwrap_or(false), Ordering::SeqCst),
            _ => {}
        }
        Ok(())
    }

    fn set_reference(&self, name: &str, targets: &[AbstractName]) -> Result<()> {
        if name == "peers" {
            *self.peers.lock().unwrap() = targets.to_vec();
        }
        Ok(())
    }

    async fn invoke(&self, operation: &str, args: Vec<AttributeValue>) -> Result<AttributeValue> {
        match (operation, args.as_slice()) {
            ("increment", [AttributeValue::Int(by)]) => {
                let now = self.count.fetch_add(*by, Ordering::SeqCst) + by;
                Ok(AttributeValue::Int(now))
            }
            ("peers", []) => Ok(AttributeValue::List(
                self.peers.lock().unwrap().iter().cloned().map(AttributeValue::Name).collect(),
            )),
            _ => Err(Error::other(format!("unexpected call {}", operation))),
        }
    }
}

pub fn recorder_info(type_name: &str, artifact: Option<Artifact>) -> ComponentInfo {
    let mut builder = ComponentInfo::builder(type_name)
        .interface("Recorder")
        .attribute(AttributeInfo::new("label", ValueKind::Str).with_default("unnamed"))
        .attribute(AttributeInfo::new("count", ValueKind::Int).mutable().with_default(0i64))
        .attribute(AttributeInfo::new("fail", ValueKind::Bool).transient().with_default(false))
        .attribute(AttributeInfo::new(CONFIGURATION_BASE_DIR, ValueKind::Path).transient())
        .reference(ReferenceInfo::multiple("peers"))
        .operation("increment", &[ValueKind::Int])
        .operation("peers", &[])
        .constructor(&["label"]);
    if let Some(artifact) = artifact {
        builder = builder.artifact(artifact);
    }
    builder.build().unwrap()
}

pub fn recorder_factory(type_name: &str, artifact: Option<Artifact>, log: EventLog) -> Arc<FnComponentFactory> {
    Arc::new(FnComponentFactory::new(
        recorder_info(type_name, artifact),
        move |args: ConstructorArgs, _context| {
            let label = args.value("label").and_then(|v| v.as_str()).unwrap_or("unnamed").to_string();
            Ok(Arc::new(Recorder {
                label,
                log: Arc::clone(&log),
                count: AtomicI64::new(0),
                fail: AtomicBool::new(false),
                peers: Mutex::new(Vec::new()),
            }) as Arc<dyn Component>)
        },
    ))
}

/// Kernel with the recorder type registered on its system loader.
pub fn kernel() -> (Kernel, EventLog) {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let kernel = Kernel::new("test");
    kernel
        .register_type(recorder_factory(RECORDER_TYPE, None, Arc::clone(&log)))
        .unwrap();
    (kernel, log)
}

pub fn name(label: &str) -> AbstractName {
    AbstractName::new("test", [("name", label)]).unwrap()
}

/// Recorder descriptor labelled with its own name.
pub fn descriptor(kernel: &Kernel, label: &str) -> ComponentDescriptor {
    let info = kernel.system_loader().load_info(RECORDER_TYPE).unwrap();
    ComponentDescriptor::new(name(label), info)
        .with_attribute("label", label)
        .unwrap()
}

/// Recorder descriptor referencing `peers` by name.
pub fn descriptor_with_peers(kernel: &Kernel, label: &str, peers: &[&str]) -> ComponentDescriptor {
    let mut descriptor = descriptor(kernel, label);
    descriptor
        .set_reference(
            "peers",
            crate::component::ReferencePattern::Names(peers.iter().map(|p| name(p)).collect()),
        )
        .unwrap();
    descriptor
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}
