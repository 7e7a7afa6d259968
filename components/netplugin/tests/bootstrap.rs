use anyhow::{Result, anyhow};
use netplugin::{
    agent::{Agent, AgentFactory},
    cli::{Invocation, parse_options},
    config::RuntimeConfig,
    error::{BootstrapError, ConfigurationError},
    helpers::privilege::PrivilegeProbe,
    identity::AddressDiscovery,
    options::OperatorOptions,
    runtime::{Preflight, preflight, run_netplugin},
};
use std::io::empty;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Probe {
    user: &'static str,
    calls: AtomicU32,
}

impl PrivilegeProbe for Probe {
    fn effective_user(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.user.to_string())
    }
}

#[derive(Default)]
struct Discovery {
    calls: AtomicU32,
}

impl AddressDiscovery for Discovery {
    fn local_address(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("192.168.7.7".to_string())
    }
}

struct IdleAgent;

impl Agent for IdleAgent {
    async fn process_current_state(&mut self) -> Result<()> {
        Ok(())
    }

    async fn post_init(&mut self) -> Result<()> {
        Ok(())
    }

    async fn handle_events(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Records the configuration it was handed.
#[derive(Default)]
struct CapturingFactory {
    seen: Arc<Mutex<Option<RuntimeConfig>>>,
    fail: bool,
}

impl AgentFactory for CapturingFactory {
    type Agent = IdleAgent;

    fn new_agent(&self, config: &RuntimeConfig) -> Result<IdleAgent> {
        *self.seen.lock().unwrap() = Some(config.clone());
        if self.fail {
            return Err(anyhow!("ovsdb unavailable"));
        }
        Ok(IdleAgent)
    }
}

fn options(args: &[&str]) -> Result<OperatorOptions, BootstrapError> {
    let argv = std::iter::once("netplugin").chain(args.iter().copied());
    match parse_options(argv, Some("node-1".to_string()), empty())? {
        Invocation::Run(opts) => Ok(*opts),
        Invocation::Help(_) => panic!("unexpected help"),
    }
}

fn root() -> Probe {
    Probe {
        user: "root",
        ..Default::default()
    }
}

#[tokio::test]
async fn explicit_ctrl_ip_flows_into_runtime_config() {
    let opts = options(&["--ctrl-ip=10.0.0.5", "--cluster-store=etcd://1.2.3.4:2379"]).unwrap();
    let probe = root();
    let discovery = Discovery::default();
    let factory = CapturingFactory::default();

    assert_eq!(preflight(&opts, &probe).unwrap(), Preflight::Proceed);
    run_netplugin(&opts, &discovery, &factory).await.unwrap();

    let cfg = factory.seen.lock().unwrap().clone().unwrap();
    assert_eq!(cfg.instance().control_ip, "10.0.0.5");
    assert_eq!(cfg.instance().tunnel_ip, "10.0.0.5");
    assert_eq!(cfg.instance().store_url, "etcd://1.2.3.4:2379");
    assert_eq!(cfg.instance().host_label, "node-1");
    assert_eq!(cfg.drivers().network, "ovs");
    assert_eq!(cfg.drivers().state, "etcd");
    assert_eq!(discovery.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_ctrl_ip_uses_discovered_address() {
    let opts = options(&["--vtep-ip=172.16.0.9", "--vlan-if=eth1,eth2", "--vlan-if=eth3"]).unwrap();
    let discovery = Discovery::default();
    let factory = CapturingFactory::default();

    run_netplugin(&opts, &discovery, &factory).await.unwrap();

    let cfg = factory.seen.lock().unwrap().clone().unwrap();
    assert_eq!(cfg.instance().control_ip, "192.168.7.7");
    assert_eq!(cfg.instance().tunnel_ip, "172.16.0.9");
    assert_eq!(cfg.instance().uplink_interfaces.as_slice(), ["eth1", "eth2", "eth3"]);
    assert_eq!(discovery.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn version_runs_nothing_else() {
    let opts = options(&["--version", "--cluster-store=badurl", "--syslog=http://x"]).unwrap();
    let probe = Probe {
        user: "nobody",
        ..Default::default()
    };
    let discovery = Discovery::default();
    let factory = CapturingFactory::default();

    assert_eq!(preflight(&opts, &probe).unwrap(), Preflight::ShowVersion);
    assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    assert_eq!(discovery.calls.load(Ordering::SeqCst), 0);
    assert!(factory.seen.lock().unwrap().is_none());
}

#[test]
fn non_root_is_rejected_whatever_the_flags() {
    let cases: [&[&str]; 3] = [
        &[],
        &["--ctrl-ip=10.0.0.5"],
        &["--debug", "--plugin-mode=kubernetes"],
    ];
    for args in cases {
        let opts = options(args).unwrap();
        let probe = Probe {
            user: "nobody",
            ..Default::default()
        };
        let err = preflight(&opts, &probe).unwrap_err();
        assert!(matches!(err, BootstrapError::Privilege(_)));
        assert_ne!(err.exit_code(), 0);
    }
}

#[tokio::test]
async fn malformed_store_url_stops_before_construction() {
    let opts = options(&["--ctrl-ip=10.0.0.5", "--cluster-store=badurl"]).unwrap();
    let factory = CapturingFactory::default();

    let err = run_netplugin(&opts, &Discovery::default(), &factory).await.unwrap_err();

    assert!(matches!(
        err,
        BootstrapError::Configuration(ConfigurationError::InvalidStoreUrl(_))
    ));
    assert!(factory.seen.lock().unwrap().is_none());
}

#[tokio::test]
async fn construction_failure_is_reported_with_its_phase() {
    let opts = options(&["--ctrl-ip=10.0.0.5"]).unwrap();
    let factory = CapturingFactory {
        fail: true,
        ..Default::default()
    };

    let err = run_netplugin(&opts, &Discovery::default(), &factory).await.unwrap_err();

    assert_eq!(err.phase(), "agent_construction");
    assert_eq!(err.to_string(), "failed to create agent: ovsdb unavailable");
}
