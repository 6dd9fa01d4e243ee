use std::{
    fmt::Write as _,
    io,
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use strum::IntoEnumIterator;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::{
    model::{GroupId, RegistrationForm},
    validation::CountryCode,
    wizard::{Draft, Navigator, Step, Wizard, WizardView},
};

#[derive(Clone, Debug, Default)]
pub struct TerminalNavigator {
    left: Arc<AtomicBool>,
}

impl TerminalNavigator {
    pub fn has_left(&self) -> bool {
        self.left.load(Ordering::SeqCst)
    }
}

impl Navigator for TerminalNavigator {
    fn reload(&self) {
        debug!("restarting registration");
        self.left.store(false, Ordering::SeqCst);
    }

    fn go_home(&self) {
        debug!("leaving registration");
        self.left.store(true, Ordering::SeqCst);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Screen {
    Loading,
    LoadFailed,
    Closed,
    Success,
    Step(Step),
}

/// Renders the current view as plain text.
pub fn render(view: &WizardView<'_>, draft: &Draft) -> String {
    let mut out = String::new();

    match view {
        WizardView::Loading => out.push_str("Loading registration form...\n"),
        WizardView::LoadFailed { message } => {
            let _ = writeln!(out, "Something went wrong\n\n{message}");
        }
        WizardView::Closed { form } => {
            let _ = writeln!(out, "{}\n", form.title);
            let _ = writeln!(
                out,
                "Registration is closed. It opens {}.",
                form.registration_opens.format("%-d %B %Y")
            );
            out.push_str("Contact the club directly if you have questions about registration.\n");
        }
        WizardView::Success { response } => {
            out.push_str("Registration complete!\n\n");
            if let Some(ref name) = response.member_name {
                let _ = writeln!(out, "Welcome, {name}!");
            }
            if !response.message.is_empty() {
                let _ = writeln!(out, "{}", response.message);
            }
            if let Some(id) = response.registration_id {
                let _ = writeln!(out, "Registration number: {id}");
            }
        }
        WizardView::Step { step, form } => {
            render_header(&mut out, form, *step);
            match step {
                Step::SelectMemberType => render_member_types(&mut out, form, draft),
                Step::PersonalDetails => render_details(&mut out, draft),
                Step::Confirm => render_summary(&mut out, form, draft),
            }
        }
    }

    out
}

fn render_header(out: &mut String, form: &RegistrationForm, current: Step) {
    let _ = writeln!(out, "{}", form.title);
    if let Some(ref description) = form.description {
        if !description.is_empty() {
            let _ = writeln!(out, "{description}");
        }
    }

    let progress: Vec<String> = [Step::SelectMemberType, Step::PersonalDetails, Step::Confirm]
        .iter()
        .map(|step| {
            let marker = if *step < current {
                "x"
            } else if *step == current {
                ">"
            } else {
                " "
            };
            format!("[{marker}] {}. {}", step.number(), step.label())
        })
        .collect();
    let _ = writeln!(out, "\n{}\n", progress.join("  "));
}

fn render_member_types(out: &mut String, form: &RegistrationForm, draft: &Draft) {
    out.push_str("Select member type\n");
    for (index, member_type) in form.member_types.iter().enumerate() {
        let selected = draft.member_type_id.as_ref() == Some(&member_type.id);
        let _ = write!(
            out,
            "  {}) {}{}",
            index + 1,
            member_type.name,
            if selected { " (selected)" } else { "" }
        );
        if let Some(price) = member_type.price {
            let _ = write!(out, " - {price:.2}");
        }
        out.push('\n');
    }

    if !form.groups.is_empty() {
        out.push_str("\nGroups\n");
        for (index, group) in form.groups.iter().enumerate() {
            let selected = draft.group_id.as_ref() == Some(&group.id);
            let _ = writeln!(
                out,
                "  {}) {}{}",
                index + 1,
                group.name,
                if selected { " (selected)" } else { "" }
            );
        }
    }
}

fn render_details(out: &mut String, draft: &Draft) {
    let details = &draft.details;
    out.push_str("Personal information\n");
    let _ = writeln!(out, "  Full name:    {}", details.full_name);
    let _ = writeln!(out, "  Email:        {}", details.email);
    let _ = writeln!(
        out,
        "  Phone number: {} {}",
        details.country_code, details.phone_number
    );
    let _ = writeln!(out, "  Birth date:   {}", details.birth_date);

    let field_errors = details.field_errors();
    if !field_errors.is_empty() {
        let _ = writeln!(out, "\n{field_errors}");
    }
}

fn render_summary(out: &mut String, form: &RegistrationForm, draft: &Draft) {
    render_details(out, draft);

    if let Some(member_type) = draft
        .member_type_id
        .as_ref()
        .and_then(|id| form.member_type(id))
    {
        let _ = writeln!(out, "\nMembership type: {}", member_type.name);
    }

    if let Some(group) = draft.group_id.as_ref().and_then(|id| form.group(id)) {
        let _ = writeln!(out, "Group: {}", group.name);
    }

    out.push_str("\nBy submitting I confirm that the information is correct, that I accept the\n");
    out.push_str("club's terms and conditions, and that I consent to the processing of my data.\n");
}

pub struct Terminal<R, W> {
    input: R,
    output: W,
    navigator: TerminalNavigator,
}

impl<R, W> Terminal<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W, navigator: TerminalNavigator) -> Self {
        Self {
            input,
            output,
            navigator,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Drives the wizard until the user leaves or input ends.
    pub async fn run(&mut self, wizard: &mut Wizard) -> io::Result<()> {
        loop {
            if self.navigator.has_left() {
                return Ok(());
            }

            let view = wizard.view();
            let screen = match &view {
                WizardView::Loading => Screen::Loading,
                WizardView::LoadFailed { .. } => Screen::LoadFailed,
                WizardView::Closed { .. } => Screen::Closed,
                WizardView::Success { .. } => Screen::Success,
                WizardView::Step { step, .. } => Screen::Step(*step),
            };
            let text = render(&view, wizard.draft());
            self.write(&text).await?;

            let handled = match screen {
                Screen::Loading => {
                    wizard.load().await;
                    true
                }
                Screen::LoadFailed => self.choose_retry(wizard, "[r] try again  [q] quit").await?,
                Screen::Closed => self.choose_retry(wizard, "[r] check again  [q] quit").await?,
                Screen::Success => self.after_success(wizard).await?,
                Screen::Step(Step::SelectMemberType) => self.select_membership(wizard).await?,
                Screen::Step(Step::PersonalDetails) => self.personal_details(wizard).await?,
                Screen::Step(Step::Confirm) => self.confirm(wizard).await?,
            };

            if !handled {
                wizard.leave();
            }
        }
    }

    async fn write(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await
    }

    /// `None` once input is exhausted.
    async fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        self.write(&format!("{label}\n> ")).await?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim().to_string()))
    }

    async fn choose_retry(&mut self, wizard: &mut Wizard, label: &str) -> io::Result<bool> {
        match self.prompt(label).await?.as_deref() {
            Some("r") => {
                wizard.retry().await;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn after_success(&mut self, wizard: &mut Wizard) -> io::Result<bool> {
        match self
            .prompt("[n] register another person  [q] quit")
            .await?
            .as_deref()
        {
            Some("n") => {
                wizard.register_another();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn select_membership(&mut self, wizard: &mut Wizard) -> io::Result<bool> {
        let Some(form) = wizard.session().form().cloned() else {
            return Ok(false);
        };

        let Some(choice) = self
            .prompt("Choose a member type by number, [n] next, [q] quit")
            .await?
        else {
            return Ok(false);
        };

        match choice.as_str() {
            "q" => return Ok(false),
            "n" => {
                if let Err(e) = wizard.next_step() {
                    self.write(&format!("{e}\n")).await?;
                }
                return Ok(true);
            }
            _ => {}
        }

        let Some(member_type) = pick(&choice, &form.member_types) else {
            self.write("Please enter one of the listed numbers.\n").await?;
            return Ok(true);
        };
        if let Err(e) = wizard.select_member_type(member_type.id.clone()) {
            self.write(&format!("{e}\n")).await?;
            return Ok(true);
        }

        if !form.groups.is_empty() {
            let Some(choice) = self.prompt("Choose a group by number (empty for none)").await?
            else {
                return Ok(false);
            };
            let group_id: Option<GroupId> = pick(&choice, &form.groups).map(|g| g.id.clone());
            if let Err(e) = wizard.select_group(group_id) {
                self.write(&format!("{e}\n")).await?;
            }
        }

        Ok(true)
    }

    async fn personal_details(&mut self, wizard: &mut Wizard) -> io::Result<bool> {
        let Some(choice) = self
            .prompt("[e] edit  [n] next  [b] back  [q] quit")
            .await?
        else {
            return Ok(false);
        };

        match choice.as_str() {
            "e" => self.edit_details(wizard).await,
            "n" => {
                if let Err(e) = wizard.next_step() {
                    self.write(&format!("Please correct the following:\n{e}\n"))
                        .await?;
                }
                Ok(true)
            }
            "b" => {
                wizard.prev_step();
                Ok(true)
            }
            "q" => Ok(false),
            _ => Ok(true),
        }
    }

    async fn edit_details(&mut self, wizard: &mut Wizard) -> io::Result<bool> {
        let current = wizard.draft().details.clone();

        let Some(full_name) = self.prompt(&keep("Full name", &current.full_name)).await? else {
            return Ok(false);
        };
        if !full_name.is_empty() {
            wizard.details_mut().full_name = full_name;
        }

        let Some(email) = self.prompt(&keep("Email", &current.email)).await? else {
            return Ok(false);
        };
        if !email.is_empty() {
            wizard.details_mut().email = email;
        }

        let codes: Vec<String> = CountryCode::iter().map(|code| code.to_string()).collect();
        let label = format!("Country code ({})", codes.join(", "));
        let Some(code) = self
            .prompt(&keep(&label, &current.country_code.to_string()))
            .await?
        else {
            return Ok(false);
        };
        if !code.is_empty() {
            match CountryCode::from_str(&code) {
                Ok(code) => wizard.details_mut().country_code = code,
                Err(_) => self.write("Unsupported country code, keeping the previous one.\n").await?,
            }
        }

        let Some(phone) = self.prompt(&keep("Phone number", &current.phone_number)).await?
        else {
            return Ok(false);
        };
        if !phone.is_empty() {
            wizard.details_mut().phone_number = phone;
        }

        let Some(birth_date) = self
            .prompt(&keep("Birth date (DD.MM.YYYY)", &current.birth_date))
            .await?
        else {
            return Ok(false);
        };
        if !birth_date.is_empty() {
            wizard.details_mut().set_birth_date(&birth_date);
        }

        Ok(true)
    }

    async fn confirm(&mut self, wizard: &mut Wizard) -> io::Result<bool> {
        if let Some(error) = wizard.session().error() {
            self.write(&format!("\nRegistration failed:\n{error}\n")).await?;
        }

        let Some(choice) = self.prompt("[s] submit  [b] back  [q] quit").await? else {
            return Ok(false);
        };

        match choice.as_str() {
            "s" => {
                if !wizard.can_proceed() {
                    return Ok(true);
                }
                self.write("Submitting...\n").await?;
                if let Err(e) = wizard.submit().await {
                    debug!("submission did not go through: {e}");
                    if wizard.session().error().is_none() {
                        self.write(&format!("{e}\n")).await?;
                    }
                }
                Ok(true)
            }
            "b" => {
                wizard.prev_step();
                Ok(true)
            }
            "q" => Ok(false),
            _ => Ok(true),
        }
    }
}

fn keep(label: &str, current: &str) -> String {
    if current.is_empty() {
        label.to_string()
    } else {
        format!("{label} [{current}]")
    }
}

fn pick<'a, T>(choice: &str, items: &'a [T]) -> Option<&'a T> {
    let index: usize = choice.trim().parse().ok()?;
    index.checked_sub(1).and_then(|index| items.get(index))
}
