//! Azure Service Management: virtual machine deployments.
//!
//! A deployment is created by posting a schema-ordered `Deployment` document
//! to the hosted service. The document nests one role whose configuration
//! sets depend on the image OS:
//!
//! ```text
//! Deployment
//! ├── Name, DeploymentSlot, Label
//! └── RoleList/Role
//!     ├── RoleName, RoleType
//!     ├── ConfigurationSets
//!     │   ├── ConfigurationSet (Linux or Windows provisioning)
//!     │   └── ConfigurationSet (NetworkConfiguration)
//!     │       ├── InputEndpoints/InputEndpoint*
//!     │       └── SubnetNames
//!     ├── DataVirtualHardDisks
//!     ├── OSVirtualHardDisk
//!     └── RoleSize
//! ```
//!
//! Azure validates element order against its schema, so the binder emits
//! elements in exactly this order, including the empty ones.

use rivet::filters::HeaderFilter;
use rivet::{
    BindingError, DescriptorError, Method, OperationDescriptor, OperationId, Registry,
    StatusMapping, XmlBinder, XmlElement, require, upper_camel,
};

/// Service Management API version sent as `x-ms-version`.
pub const API_VERSION: &str = "2014-06-01";

/// Namespace of every Service Management document.
pub const NAMESPACE: &str = "http://schemas.microsoft.com/windowsazure";

/// `POST /services/hostedservices/{service}/deployments`.
///
/// Azure answers `202 Accepted` and runs the deployment asynchronously.
pub const CREATE_DEPLOYMENT: OperationId<DeploymentParams, ()> =
    OperationId::new("azure.deployment.create");

/// Operating system of the source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsType {
    /// Linux image.
    Linux,
    /// Windows image.
    Windows,
    /// A value reported by the image catalog that has no provisioning set.
    Unrecognized(String),
}

/// Virtual machine size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum RoleSize {
    ExtraSmall,
    Small,
    Medium,
    Large,
    ExtraLarge,
    A5,
    A6,
    A7,
    StandardD1,
    StandardD2,
}

impl RoleSize {
    /// The catalog name (`EXTRA_SMALL`, `STANDARD_D1`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExtraSmall => "EXTRA_SMALL",
            Self::Small => "SMALL",
            Self::Medium => "MEDIUM",
            Self::Large => "LARGE",
            Self::ExtraLarge => "EXTRA_LARGE",
            Self::A5 => "A5",
            Self::A6 => "A6",
            Self::A7 => "A7",
            Self::StandardD1 => "STANDARD_D1",
            Self::StandardD2 => "STANDARD_D2",
        }
    }

    /// The name written in `RoleSize` (`ExtraSmall`, `StandardD1`).
    #[must_use]
    pub fn wire_name(self) -> String {
        upper_camel(self.as_str())
    }
}

/// Transport protocol of an input endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// TCP.
    Tcp,
    /// UDP.
    Udp,
}

impl Protocol {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

/// A public port mapped onto the virtual machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEndpoint {
    /// Endpoint name, unique within the deployment.
    pub name: String,
    /// Port inside the virtual machine.
    pub local_port: u16,
    /// Public port.
    pub external_port: u16,
    /// Protocol.
    pub protocol: Protocol,
}

impl InputEndpoint {
    /// Create an endpoint.
    pub fn new(name: impl Into<String>, protocol: Protocol, local_port: u16, external_port: u16) -> Self {
        Self {
            name: name.into(),
            local_port,
            external_port,
            protocol,
        }
    }

    fn to_xml(&self) -> XmlElement {
        XmlElement::new("InputEndpoint")
            .child(XmlElement::leaf("LocalPort", self.local_port.to_string()))
            .child(XmlElement::leaf("Name", &self.name))
            .child(XmlElement::leaf("Port", self.external_port.to_string()))
            .child(XmlElement::leaf("Protocol", self.protocol.as_str()))
    }
}

/// Active Directory domain a Windows machine joins at provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainJoin {
    /// Domain of the joining account.
    pub domain: String,
    /// Joining account.
    pub username: String,
    /// Joining account password.
    pub password: String,
    /// Domain to join.
    pub join_domain: String,
}

/// Parameters of a single-role virtual machine deployment.
#[derive(Clone, PartialEq, Eq)]
pub struct DeploymentParams {
    /// Deployment, role and host name.
    pub name: String,
    /// Image to provision from.
    pub source_image_name: String,
    /// Image operating system.
    pub os_type: OsType,
    /// Virtual machine size.
    pub size: RoleSize,
    /// Administrator account.
    pub username: String,
    /// Administrator password.
    pub password: String,
    /// Storage account holding the OS disk.
    pub storage_account: String,
    /// Public endpoints, in declaration order.
    pub endpoints: Vec<InputEndpoint>,
    /// Domain join settings, Windows only.
    pub domain_join: Option<DomainJoin>,
}

impl std::fmt::Debug for DeploymentParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentParams")
            .field("name", &self.name)
            .field("source_image_name", &self.source_image_name)
            .field("os_type", &self.os_type)
            .field("size", &self.size)
            .field("username", &self.username)
            .field("storage_account", &self.storage_account)
            .field("endpoints", &self.endpoints)
            .field("domain_join", &self.domain_join.as_ref().map(|join| &join.join_domain))
            .finish_non_exhaustive()
    }
}

/// Builds the `Deployment` document.
///
/// # Errors
///
/// [`BindingError::MissingField`] when a value the document derives from is
/// empty, and [`BindingError::UnsupportedVariant`] for an unrecognized OS.
pub fn deployment_xml(params: &DeploymentParams) -> Result<XmlElement, BindingError> {
    let name = require("name", &params.name)?;
    let image = require("source_image_name", &params.source_image_name)?;
    let storage_account = require("storage_account", &params.storage_account)?;
    let username = require("username", &params.username)?;

    let (provisioning, os) = match &params.os_type {
        OsType::Linux => (
            linux_provisioning(name, username, require("password", &params.password)?),
            "Linux",
        ),
        OsType::Windows => (windows_provisioning(params, username)?, "Windows"),
        OsType::Unrecognized(value) => {
            return Err(BindingError::unsupported_variant("os_type", value.as_str()));
        }
    };

    let media_link = format!("http://{storage_account}.blob.core.windows.net/disks/{name}/{image}");

    let role = XmlElement::new("Role")
        .child(XmlElement::leaf("RoleName", name))
        .child(XmlElement::leaf("RoleType", "PersistentVMRole"))
        .child(
            XmlElement::new("ConfigurationSets")
                .child(provisioning)
                .child(network_configuration(&params.endpoints)),
        )
        .child(XmlElement::new("DataVirtualHardDisks"))
        .child(
            XmlElement::new("OSVirtualHardDisk")
                .child(XmlElement::leaf("HostCaching", "ReadWrite"))
                .child(XmlElement::leaf("MediaLink", media_link))
                .child(XmlElement::leaf("SourceImageName", image))
                .child(XmlElement::leaf("OS", os)),
        )
        .child(XmlElement::leaf("RoleSize", params.size.wire_name()));

    Ok(XmlElement::new("Deployment")
        .attr("xmlns", NAMESPACE)
        .child(XmlElement::leaf("Name", name))
        .child(XmlElement::leaf("DeploymentSlot", "Production"))
        .child(XmlElement::leaf("Label", name))
        .child(XmlElement::new("RoleList").child(role)))
}

fn linux_provisioning(name: &str, username: &str, password: &str) -> XmlElement {
    XmlElement::new("ConfigurationSet")
        .child(XmlElement::leaf(
            "ConfigurationSetType",
            "LinuxProvisioningConfiguration",
        ))
        .child(XmlElement::leaf("HostName", name))
        .child(XmlElement::leaf("UserName", username))
        .child(XmlElement::leaf("UserPassword", password))
        .child(XmlElement::leaf("DisableSshPasswordAuthentication", "false"))
        .child(XmlElement::new("SSH"))
}

fn windows_provisioning(params: &DeploymentParams, username: &str) -> Result<XmlElement, BindingError> {
    let password = require("password", &params.password)?;

    let domain_join = params
        .domain_join
        .as_ref()
        .map(|join| {
            Ok::<_, BindingError>(
                XmlElement::new("DomainJoin")
                    .child(
                        XmlElement::new("Credentials")
                            .child(XmlElement::leaf("Domain", require("domain_join.domain", &join.domain)?))
                            .child(XmlElement::leaf("Username", require("domain_join.username", &join.username)?))
                            .child(XmlElement::leaf("Password", &join.password)),
                    )
                    .child(XmlElement::leaf(
                        "JoinDomain",
                        require("domain_join.join_domain", &join.join_domain)?,
                    )),
            )
        })
        .transpose()?;

    Ok(XmlElement::new("ConfigurationSet")
        .child(XmlElement::leaf(
            "ConfigurationSetType",
            "WindowsProvisioningConfiguration",
        ))
        .child(XmlElement::leaf("ComputerName", username))
        .child(XmlElement::leaf("AdminPassword", password))
        .child(XmlElement::leaf("ResetPasswordOnFirstLogon", "false"))
        .child(XmlElement::leaf("EnableAutomaticUpdate", "false"))
        .child_opt(domain_join)
        .child(XmlElement::new("StoredCertificateSettings")))
}

fn network_configuration(endpoints: &[InputEndpoint]) -> XmlElement {
    XmlElement::new("ConfigurationSet")
        .child(XmlElement::leaf("ConfigurationSetType", "NetworkConfiguration"))
        .child(XmlElement::new("InputEndpoints").children(endpoints.iter().map(InputEndpoint::to_xml)))
        .child(XmlElement::new("SubnetNames"))
}

/// The `CREATE_DEPLOYMENT` descriptor.
///
/// # Errors
///
/// Fails only if the descriptor itself is malformed.
pub fn create_deployment() -> Result<OperationDescriptor<DeploymentParams, ()>, DescriptorError> {
    OperationDescriptor::builder(
        CREATE_DEPLOYMENT,
        Method::Post,
        "/services/hostedservices/{service}/deployments",
    )
    .binder(XmlBinder::new(deployment_xml))
    .filter(HeaderFilter::new().header("x-ms-version", API_VERSION))
    .no_result()
    .on_status(404, StatusMapping::NotFound)
    .on_status(409, StatusMapping::Conflict)
    .on_status(403, StatusMapping::AccessDenied)
    .build()
}

/// Register every Azure descriptor.
///
/// # Errors
///
/// [`DescriptorError::DuplicateOperation`] if an Azure operation is already
/// registered.
pub fn register(registry: &mut Registry) -> Result<(), DescriptorError> {
    registry.register(create_deployment()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rivet::url::Url;
    use rivet::{PathArgs, RequestFilter};

    fn params(os_type: OsType) -> DeploymentParams {
        DeploymentParams {
            name: "web01".to_string(),
            source_image_name: "ubuntu-14_04".to_string(),
            os_type,
            size: RoleSize::ExtraSmall,
            username: "ops".to_string(),
            password: "s3cret!".to_string(),
            storage_account: "acmedisks".to_string(),
            endpoints: Vec::new(),
            domain_join: None,
        }
    }

    fn set_types(document: &XmlElement) -> Vec<String> {
        document
            .descendants_named("ConfigurationSetType")
            .into_iter()
            .map(XmlElement::text_content)
            .collect()
    }

    #[test]
    fn linux_gets_linux_provisioning_only() {
        let document = deployment_xml(&params(OsType::Linux)).expect("bind");

        check!(set_types(&document) == ["LinuxProvisioningConfiguration", "NetworkConfiguration"]);
        check!(document.descendants_named("HostName").len() == 1);
        check!(document.descendants_named("ComputerName").is_empty());
        let matches = document.descendants_named("OS");
        let_assert!([os] = matches.as_slice());
        check!(os.text_content() == "Linux");
    }

    #[test]
    fn windows_gets_windows_provisioning_only() {
        let document = deployment_xml(&params(OsType::Windows)).expect("bind");

        check!(set_types(&document) == ["WindowsProvisioningConfiguration", "NetworkConfiguration"]);
        check!(document.descendants_named("HostName").is_empty());
        check!(document.descendants_named("DomainJoin").is_empty());
        check!(document.descendants_named("StoredCertificateSettings").len() == 1);
        let matches = document.descendants_named("OS");
        let_assert!([os] = matches.as_slice());
        check!(os.text_content() == "Windows");
    }

    #[test]
    fn windows_domain_join_when_present() {
        let mut windows = params(OsType::Windows);
        windows.domain_join = Some(DomainJoin {
            domain: "corp".to_string(),
            username: "joiner".to_string(),
            password: "pw".to_string(),
            join_domain: "corp.example.com".to_string(),
        });

        let document = deployment_xml(&windows).expect("bind");
        let matches = document.descendants_named("DomainJoin");
        let_assert!([join] = matches.as_slice());
        let names: Vec<_> = join.child_elements().map(XmlElement::name).collect();
        check!(names == ["Credentials", "JoinDomain"]);
        check!(join.find("JoinDomain").map(XmlElement::text_content).as_deref() == Some("corp.example.com"));
    }

    #[test]
    fn unrecognized_os_is_rejected() {
        let err = deployment_xml(&params(OsType::Unrecognized("SOLARIS".to_string())))
            .expect_err("unsupported");
        let_assert!(BindingError::UnsupportedVariant { field, value } = err);
        check!(field == "os_type");
        check!(value == "SOLARIS");
    }

    #[test]
    fn no_endpoints_keeps_the_wrapper() {
        let document = deployment_xml(&params(OsType::Linux)).expect("bind");
        let matches = document.descendants_named("InputEndpoints");
        let_assert!([wrapper] = matches.as_slice());
        check!(wrapper.child_elements().count() == 0);
        check!(document.descendants_named("SubnetNames").len() == 1);
    }

    #[test]
    fn endpoints_keep_declaration_order() {
        let mut linux = params(OsType::Linux);
        linux.endpoints = vec![
            InputEndpoint::new("ssh", Protocol::Tcp, 22, 2222),
            InputEndpoint::new("dns", Protocol::Udp, 53, 53),
        ];

        let document = deployment_xml(&linux).expect("bind");
        let endpoints = document.descendants_named("InputEndpoint");
        let names: Vec<_> = endpoints
            .iter()
            .filter_map(|endpoint| endpoint.find("Name"))
            .map(XmlElement::text_content)
            .collect();
        check!(names == ["ssh", "dns"]);
        let_assert!(Some(port) = endpoints[0].find("Port"));
        check!(port.text_content() == "2222");
        let_assert!(Some(protocol) = endpoints[1].find("Protocol"));
        check!(protocol.text_content() == "udp");
    }

    #[test]
    fn equal_inputs_give_identical_bodies() {
        let a = deployment_xml(&params(OsType::Linux)).expect("bind").to_xml_string();
        let b = deployment_xml(&params(OsType::Linux)).expect("bind").to_xml_string();
        check!(a == b);
    }

    #[test]
    fn missing_storage_account() {
        let mut linux = params(OsType::Linux);
        linux.storage_account = String::new();
        let err = deployment_xml(&linux).expect_err("missing");
        check!(matches!(err, BindingError::MissingField(ref field) if field == "storage_account"));
    }

    #[test]
    fn missing_password_on_either_os() {
        for os_type in [OsType::Linux, OsType::Windows] {
            let mut input = params(os_type);
            input.password = String::new();
            let err = deployment_xml(&input).expect_err("missing");
            check!(matches!(err, BindingError::MissingField(ref field) if field == "password"));
        }
    }

    #[test]
    fn role_size_wire_names() {
        check!(RoleSize::ExtraSmall.wire_name() == "ExtraSmall");
        check!(RoleSize::A5.wire_name() == "A5");
        check!(RoleSize::StandardD2.wire_name() == "StandardD2");
    }

    #[test]
    fn linux_document_snapshot() {
        let mut linux = params(OsType::Linux);
        linux.endpoints = vec![InputEndpoint::new("ssh", Protocol::Tcp, 22, 22)];
        let xml = deployment_xml(&linux).expect("bind").to_xml_string();

        insta::assert_snapshot!(xml, @r#"<Deployment xmlns="http://schemas.microsoft.com/windowsazure"><Name>web01</Name><DeploymentSlot>Production</DeploymentSlot><Label>web01</Label><RoleList><Role><RoleName>web01</RoleName><RoleType>PersistentVMRole</RoleType><ConfigurationSets><ConfigurationSet><ConfigurationSetType>LinuxProvisioningConfiguration</ConfigurationSetType><HostName>web01</HostName><UserName>ops</UserName><UserPassword>s3cret!</UserPassword><DisableSshPasswordAuthentication>false</DisableSshPasswordAuthentication><SSH/></ConfigurationSet><ConfigurationSet><ConfigurationSetType>NetworkConfiguration</ConfigurationSetType><InputEndpoints><InputEndpoint><LocalPort>22</LocalPort><Name>ssh</Name><Port>22</Port><Protocol>tcp</Protocol></InputEndpoint></InputEndpoints><SubnetNames/></ConfigurationSet></ConfigurationSets><DataVirtualHardDisks/><OSVirtualHardDisk><HostCaching>ReadWrite</HostCaching><MediaLink>http://acmedisks.blob.core.windows.net/disks/web01/ubuntu-14_04</MediaLink><SourceImageName>ubuntu-14_04</SourceImageName><OS>Linux</OS></OSVirtualHardDisk><RoleSize>ExtraSmall</RoleSize></Role></RoleList></Deployment>"#);
    }

    #[test]
    fn descriptor_builds_versioned_xml_request() {
        let descriptor = create_deployment().expect("descriptor");
        let base = Url::parse("https://management.core.windows.net/sub-1").expect("url");
        let args = PathArgs::new().with("service", "web");

        let request = descriptor
            .build_request(&base, &args, &params(OsType::Linux))
            .expect("request");
        let request = rivet::apply_filters(descriptor.filters(), request).expect("filters");

        check!(request.method() == Method::Post);
        check!(
            request.url().as_str()
                == "https://management.core.windows.net/sub-1/services/hostedservices/web/deployments"
        );
        check!(request.header("x-ms-version") == Some(API_VERSION));
        check!(request.header("content-type") == Some("application/xml"));
        check!(request.body_bytes().starts_with(b"<Deployment xmlns="));
        check!(descriptor.status_mapping(404) == Some(StatusMapping::NotFound));
        check!(!descriptor.is_idempotent());

        let version_filter = HeaderFilter::new().header("x-ms-version", API_VERSION);
        let again = version_filter.apply(request).expect("filter");
        check!(again.headers().get_all("x-ms-version").count() == 1);
    }
}
